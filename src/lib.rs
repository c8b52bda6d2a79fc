//! Core of a memory-matching card game.
//!
//! Sixteen cards, eight emoji pairs, flipped two at a time. [`Game`] deals the
//! board, sequences turns, runs the elapsed-time ticker and keeps the best
//! score in a [`KeyValueStore`]. Rendering and input belong to the front-end:
//! it calls [`Game::select`] for each card activation and listens on a
//! [`DisplaySink`].
//!
//! ```
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! use memory_cards::{Game, GameConfig, ManualScheduler, MemoryStore, NullSink};
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let game = Game::new(
//!     GameConfig::default(),
//!     scheduler.clone(),
//!     Rc::new(MemoryStore::new()),
//!     Rc::new(NullSink),
//! )
//! .unwrap();
//!
//! game.start_round();
//! game.select(0);
//! scheduler.advance(Duration::from_secs(2));
//! assert_eq!(game.elapsed_seconds(), 2);
//! ```

pub mod config;
pub mod deck;
pub mod display;
pub mod engine;
pub mod error;
pub mod game;
pub mod records;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod timer;

pub use config::GameConfig;
pub use display::{DisplaySink, GameEvent, LogSink, NullSink, RecordingSink, RoundSummary};
pub use engine::{Ignored, Selection};
pub use error::{GameError, Result, StorageError};
pub use game::Game;
pub use records::ScoreStore;
#[cfg(feature = "glib")]
pub use scheduler::GlibScheduler;
pub use scheduler::{ControlFlow, ManualScheduler, Scheduler, TaskId};
pub use state::{BestScore, Card, CardState, Round, Symbol, TOTAL_PAIRS, Turn};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
