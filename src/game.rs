//! The game controller: owns the round, its ticker and the score store, and
//! routes every mutation through its methods.
//!
//! Deferred work (the ticker and mismatch reversions) holds only a weak
//! reference to the game plus the generation of the round that scheduled it.
//! A callback that wakes up after a restart sees a different generation and
//! does nothing. Display events are sent after the state borrow is released,
//! so a sink may call straight back into the game.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rand::RngCore;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::deck;
use crate::display::{DisplaySink, GameEvent, RoundSummary};
use crate::engine::Selection;
use crate::error::Result;
use crate::records::ScoreStore;
use crate::scheduler::{ControlFlow, Scheduler};
use crate::state::{BestScore, Round, TOTAL_PAIRS};
use crate::storage::KeyValueStore;
use crate::timer::Timer;

struct GameState {
    round: Round,
    timer: Timer,
    generation: u64,
    best: Option<BestScore>,
    last_summary: Option<RoundSummary>,
    rng: Box<dyn RngCore>,
    /// Ticker time of the current round; whole seconds land in the round.
    elapsed_ms: u64,
}

struct Shared {
    config: GameConfig,
    scheduler: Rc<dyn Scheduler>,
    sink: Rc<dyn DisplaySink>,
    scores: ScoreStore,
    state: RefCell<GameState>,
}

/// Handle on one game. Clones share the same state.
#[derive(Clone)]
pub struct Game {
    shared: Rc<Shared>,
}

impl Game {
    /// # Errors
    /// Returns `GameError::Config` if `config` does not validate.
    pub fn new(
        config: GameConfig,
        scheduler: Rc<dyn Scheduler>,
        store: Rc<dyn KeyValueStore>,
        sink: Rc<dyn DisplaySink>,
    ) -> Result<Self> {
        config.validate()?;
        let scores = ScoreStore::new(store, config.storage_key.clone());
        let best = scores.read();
        let state = GameState {
            round: Round::idle(),
            timer: Timer::new(),
            generation: 0,
            best,
            last_summary: None,
            rng: Box::new(rand::rng()),
            elapsed_ms: 0,
        };
        Ok(Game {
            shared: Rc::new(Shared {
                config,
                scheduler,
                sink,
                scores,
                state: RefCell::new(state),
            }),
        })
    }

    /// Deal from `rng` instead of the thread-local generator.
    pub fn with_rng(self, rng: Box<dyn RngCore>) -> Self {
        self.shared.state.borrow_mut().rng = rng;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.shared.config
    }

    /// Start a fresh round, abandoning any round in progress.
    pub fn start_round(&self) {
        let events = {
            let mut guard = self.shared.state.borrow_mut();
            let st = &mut *guard;
            st.timer.stop(&*self.shared.scheduler);

            st.generation = st.generation.wrapping_add(1);
            let generation = st.generation;
            let cards = deck::generate(&mut *st.rng);
            st.round = Round::new(cards, generation);
            st.best = self.shared.scores.read();
            st.last_summary = None;
            start_timer(&self.shared, st);
            debug!(generation, "round started");

            vec![
                GameEvent::BoardDealt {
                    generation,
                    cards: st.round.cards.clone(),
                },
                GameEvent::MovesChanged(0),
                GameEvent::PairsChanged {
                    matched: 0,
                    total: TOTAL_PAIRS,
                },
                GameEvent::TimeChanged(0),
                GameEvent::BestScoreChanged(st.best),
            ]
        };
        self.shared.emit(&events);
    }

    /// Handle a player activating the card at `position`.
    pub fn select(&self, position: usize) -> Selection {
        let mut events = Vec::new();
        let outcome = {
            let mut guard = self.shared.state.borrow_mut();
            let st = &mut *guard;
            let outcome = st.round.select(position);
            match outcome {
                Selection::Ignored(_) => {}
                Selection::FirstFlipped { position } => {
                    events.push(GameEvent::CardFlipped {
                        position,
                        symbol: st.round.cards[position].symbol,
                    });
                }
                Selection::Matched {
                    first,
                    second,
                    round_complete,
                } => {
                    events.push(GameEvent::CardFlipped {
                        position: second,
                        symbol: st.round.cards[second].symbol,
                    });
                    events.push(GameEvent::MovesChanged(st.round.move_count));
                    events.push(GameEvent::CardsMatched { first, second });
                    events.push(GameEvent::PairsChanged {
                        matched: st.round.matched_pairs,
                        total: TOTAL_PAIRS,
                    });
                    if round_complete {
                        self.shared.complete_round(st, &mut events);
                    }
                }
                Selection::Mismatched { first, second } => {
                    events.push(GameEvent::CardFlipped {
                        position: second,
                        symbol: st.round.cards[second].symbol,
                    });
                    events.push(GameEvent::MovesChanged(st.round.move_count));
                    schedule_mismatch_reset(&self.shared, st.round.generation, first, second);
                }
            }
            outcome
        };
        self.shared.emit(&events);
        outcome
    }

    /// A copy of the current round.
    pub fn round(&self) -> Round {
        self.shared.state.borrow().round.clone()
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.borrow().round.active
    }

    pub fn is_locked(&self) -> bool {
        self.shared.state.borrow().round.is_locked()
    }

    pub fn move_count(&self) -> u32 {
        self.shared.state.borrow().round.move_count
    }

    pub fn matched_pairs(&self) -> u32 {
        self.shared.state.borrow().round.matched_pairs
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.shared.state.borrow().round.elapsed_seconds
    }

    pub fn generation(&self) -> u64 {
        self.shared.state.borrow().generation
    }

    pub fn timer_running(&self) -> bool {
        self.shared.state.borrow().timer.is_running()
    }

    /// Best score as last read from storage.
    pub fn best_score(&self) -> Option<BestScore> {
        self.shared.state.borrow().best
    }

    pub fn last_summary(&self) -> Option<RoundSummary> {
        self.shared.state.borrow().last_summary.clone()
    }
}

impl Shared {
    fn emit(&self, events: &[GameEvent]) {
        for event in events {
            self.sink.notify(event);
        }
    }

    fn complete_round(&self, st: &mut GameState, events: &mut Vec<GameEvent>) {
        st.timer.stop(&*self.scheduler);
        st.round.active = false;

        let moves = st.round.move_count;
        let elapsed = st.round.elapsed_seconds;
        let previous_best = self.scores.read();
        let beats_previous = previous_best.is_none_or(|best| best.is_beaten_by(moves));
        let new_record = beats_previous && self.scores.write(moves, elapsed);
        if new_record {
            st.best = Some(BestScore {
                moves,
                time_seconds: elapsed,
            });
        } else {
            st.best = previous_best;
        }

        let summary = RoundSummary {
            total_pairs: TOTAL_PAIRS,
            elapsed_seconds: elapsed,
            moves,
            previous_best,
            new_record,
        };
        info!(
            generation = st.round.generation,
            moves,
            elapsed,
            new_record,
            "round won"
        );
        st.last_summary = Some(summary.clone());
        events.push(GameEvent::RoundWon(summary));
        events.push(GameEvent::BestScoreChanged(st.best));
    }

    fn tick(&self, generation: u64) -> ControlFlow {
        let elapsed = {
            let mut st = self.state.borrow_mut();
            if st.round.generation != generation || !st.round.active {
                debug!(generation, "stale timer tick ignored");
                return ControlFlow::Break;
            }
            st.elapsed_ms = st.elapsed_ms.saturating_add(self.config.tick_interval_ms);
            let secs = u32::try_from(st.elapsed_ms / 1000).unwrap_or(u32::MAX);
            if secs == st.round.elapsed_seconds {
                return ControlFlow::Continue;
            }
            st.round.elapsed_seconds = secs;
            secs
        };
        self.emit(&[GameEvent::TimeChanged(elapsed)]);
        ControlFlow::Continue
    }

    fn revert_mismatch(&self, generation: u64, first: usize, second: usize) {
        let reverted = self
            .state
            .borrow_mut()
            .round
            .resolve_mismatch(generation, first, second);
        if reverted {
            self.emit(&[GameEvent::CardsHidden { first, second }]);
        } else {
            debug!(generation, first, second, "stale mismatch reversion ignored");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        st.timer.stop(&*self.scheduler);
    }
}

fn start_timer(shared: &Rc<Shared>, st: &mut GameState) {
    st.round.elapsed_seconds = 0;
    st.elapsed_ms = 0;
    let generation = st.round.generation;
    let weak: Weak<Shared> = Rc::downgrade(shared);
    st.timer.start(
        &*shared.scheduler,
        shared.config.tick_interval(),
        Box::new(move || match weak.upgrade() {
            Some(shared) => shared.tick(generation),
            None => ControlFlow::Break,
        }),
    );
}

fn schedule_mismatch_reset(shared: &Rc<Shared>, generation: u64, first: usize, second: usize) {
    let weak: Weak<Shared> = Rc::downgrade(shared);
    shared.scheduler.schedule_once(
        shared.config.mismatch_delay(),
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.revert_mismatch(generation, first, second);
            }
        }),
    );
}
