//! What the game tells its front-end, and how those values read on screen.

use std::cell::RefCell;

use tracing::debug;

use crate::state::{BestScore, Card, Symbol, TOTAL_PAIRS};

pub fn format_mm_ss(total_secs: u32) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

pub fn pairs_label(matched: u32) -> String {
    format!("{} / {}", matched, TOTAL_PAIRS)
}

pub fn best_score_label(best: Option<BestScore>) -> String {
    match best {
        Some(best) => format!(
            "Best: {} moves ({})",
            best.moves,
            format_mm_ss(best.time_seconds)
        ),
        None => "Best: -".to_string(),
    }
}

/// Keys that activate a focused card, matching a click.
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub total_pairs: u32,
    pub elapsed_seconds: u32,
    pub moves: u32,
    pub previous_best: Option<BestScore>,
    pub new_record: bool,
}

impl RoundSummary {
    pub fn message(&self) -> String {
        let mut text = format!(
            "You matched all {} pairs in {} with {} moves!",
            self.total_pairs,
            format_mm_ss(self.elapsed_seconds),
            self.moves
        );
        if self.new_record {
            text.push_str(" 🏆 New record!");
        } else if let Some(best) = self.previous_best {
            text.push_str(&format!(" (Best: {} moves)", best.moves));
        }
        text
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// A new board is face down and the counters are zeroed.
    BoardDealt { generation: u64, cards: Vec<Card> },
    CardFlipped { position: usize, symbol: Symbol },
    CardsMatched { first: usize, second: usize },
    CardsHidden { first: usize, second: usize },
    MovesChanged(u32),
    PairsChanged { matched: u32, total: u32 },
    TimeChanged(u32),
    RoundWon(RoundSummary),
    BestScoreChanged(Option<BestScore>),
}

impl GameEvent {
    /// The text a simple front-end would put on screen, if any.
    pub fn display_text(&self) -> Option<String> {
        match self {
            GameEvent::MovesChanged(moves) => Some(moves.to_string()),
            GameEvent::PairsChanged { matched, .. } => Some(pairs_label(*matched)),
            GameEvent::TimeChanged(secs) => Some(format_mm_ss(*secs)),
            GameEvent::RoundWon(summary) => Some(summary.message()),
            GameEvent::BestScoreChanged(best) => Some(best_score_label(*best)),
            _ => None,
        }
    }
}

pub trait DisplaySink {
    fn notify(&self, event: &GameEvent);
}

#[derive(Debug, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn notify(&self, _event: &GameEvent) {}
}

/// Writes every event to the `tracing` log.
#[derive(Debug, Default)]
pub struct LogSink;

impl DisplaySink for LogSink {
    fn notify(&self, event: &GameEvent) {
        match event.display_text() {
            Some(text) => debug!(?event, %text, "display update"),
            None => debug!(?event, "display update"),
        }
    }
}

/// Keeps every event, for headless front-ends and tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<GameEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn last_time(&self) -> Option<u32> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            GameEvent::TimeChanged(secs) => Some(*secs),
            _ => None,
        })
    }

    pub fn summaries(&self) -> Vec<RoundSummary> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                GameEvent::RoundWon(summary) => Some(summary.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    fn notify(&self, event: &GameEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
