use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::STORAGE_KEY;
use crate::state::BestScore;
use crate::storage::KeyValueStore;

/// Best-score persistence on top of a [`KeyValueStore`]. Storage trouble
/// never reaches gameplay: reads degrade to "no record", writes to a no-op.
pub struct ScoreStore {
    store: Rc<dyn KeyValueStore>,
    key: String,
}

fn parse_best_score(raw: &str) -> Option<BestScore> {
    let best: BestScore = serde_json::from_str(raw).ok()?;
    if best.moves == 0 {
        return None;
    }
    Some(best)
}

impl ScoreStore {
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        ScoreStore {
            store,
            key: key.into(),
        }
    }

    pub fn with_default_key(store: Rc<dyn KeyValueStore>) -> Self {
        Self::new(store, STORAGE_KEY)
    }

    pub fn read(&self) -> Option<BestScore> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "could not read best score");
                return None;
            }
        };
        let best = parse_best_score(&raw);
        if best.is_none() {
            warn!(key = %self.key, "ignoring malformed best score record");
        }
        best
    }

    /// Store `moves`/`time_seconds` if there is no record yet or `moves` is
    /// strictly lower. Returns whether a new record was written.
    pub fn write(&self, moves: u32, time_seconds: u32) -> bool {
        if moves == 0 {
            return false;
        }
        if let Some(current) = self.read()
            && !current.is_beaten_by(moves)
        {
            return false;
        }

        let best = BestScore {
            moves,
            time_seconds,
        };
        let raw = match serde_json::to_string(&best) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "could not encode best score");
                return false;
            }
        };
        match self.store.set(&self.key, &raw) {
            Ok(()) => {
                debug!(moves, time_seconds, "new best score stored");
                true
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "could not save best score");
                false
            }
        }
    }
}
