//! Tunables for a game controller, loadable from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

pub const MISMATCH_DELAY_MS: u64 = 800;
pub const TICK_INTERVAL_MS: u64 = 1000;
pub const STORAGE_KEY: &str = "memoryCardBestScore";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// How long two mismatched cards stay face up before turning back.
    pub mismatch_delay_ms: u64,
    /// Period of the elapsed-time ticker. Ticks add their length to the
    /// round clock, which shows whole seconds.
    pub tick_interval_ms: u64,
    /// Key the best score is stored under.
    pub storage_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            mismatch_delay_ms: MISMATCH_DELAY_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
            storage_key: STORAGE_KEY.to_string(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `GameError::Json` for malformed JSON and `GameError::Config`
    /// when a value is out of range.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or fails [`GameConfig::from_json`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(GameError::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(GameError::Config("storage_key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
