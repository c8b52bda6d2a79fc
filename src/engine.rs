//! Turn sequencing: flipping cards, counting moves, matching pairs.
//!
//! Everything here is synchronous. The mismatch delay is owned by the
//! controller, which calls [`Round::resolve_mismatch`] once it elapses.

use tracing::trace;

use crate::state::{CardState, Round, TOTAL_PAIRS, Turn};

/// Why a selection was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ignored {
    Inactive,
    OutOfRange,
    Locked,
    AlreadyPending,
    AlreadyRevealed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Ignored(Ignored),
    /// First card of a pair is up; no move counted yet.
    FirstFlipped { position: usize },
    Matched {
        first: usize,
        second: usize,
        round_complete: bool,
    },
    /// Board is now locked until the pair is turned back down.
    Mismatched { first: usize, second: usize },
}

impl Selection {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Selection::Ignored(_))
    }
}

impl Round {
    fn check_selectable(&self, position: usize) -> Result<(), Ignored> {
        if !self.active {
            return Err(Ignored::Inactive);
        }
        let Some(card) = self.cards.get(position) else {
            return Err(Ignored::OutOfRange);
        };
        if self.is_locked() {
            return Err(Ignored::Locked);
        }
        if self.pending_first() == Some(position) {
            return Err(Ignored::AlreadyPending);
        }
        if card.state != CardState::FaceDown {
            return Err(Ignored::AlreadyRevealed);
        }
        Ok(())
    }

    /// Activate the card at `position`.
    pub fn select(&mut self, position: usize) -> Selection {
        if let Err(reason) = self.check_selectable(position) {
            trace!(position, ?reason, "selection ignored");
            return Selection::Ignored(reason);
        }

        self.cards[position].state = CardState::FaceUp;

        let first = match self.turn {
            Turn::OneUp(first) => first,
            _ => {
                self.turn = Turn::OneUp(position);
                return Selection::FirstFlipped { position };
            }
        };

        let second = position;
        self.move_count = self.move_count.saturating_add(1);
        self.turn = Turn::Evaluating { first, second };

        if self.cards[first].symbol == self.cards[second].symbol {
            self.cards[first].state = CardState::Matched;
            self.cards[second].state = CardState::Matched;
            self.matched_pairs += 1;
            self.turn = Turn::Idle;
            Selection::Matched {
                first,
                second,
                round_complete: self.matched_pairs == TOTAL_PAIRS,
            }
        } else {
            Selection::Mismatched { first, second }
        }
    }

    /// Turn a mismatched pair back down and unlock the board.
    ///
    /// Returns `false` without touching anything when `generation` is not
    /// this round's or the pair is no longer the one under evaluation.
    pub fn resolve_mismatch(&mut self, generation: u64, first: usize, second: usize) -> bool {
        if generation != self.generation {
            return false;
        }
        if self.turn != (Turn::Evaluating { first, second }) {
            return false;
        }
        for idx in [first, second] {
            if let Some(card) = self.cards.get_mut(idx)
                && card.state == CardState::FaceUp
            {
                card.state = CardState::FaceDown;
            }
        }
        self.turn = Turn::Idle;
        true
    }
}
