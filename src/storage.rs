//! Key-value persistence the game reads its best score from.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::error::StorageError;

const STORE_DIR_NAME: &str = "memory-cards";
const STORE_FILE_NAME: &str = "storage.json";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-process store. Reads and writes can be switched off to mimic a host
/// that blocks storage or runs out of quota.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<BTreeMap<String, String>>,
    reads_blocked: Cell<bool>,
    writes_blocked: Cell<bool>,
    quota_bytes: Cell<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every access fails.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.block_reads(true);
        store.block_writes(true);
        store
    }

    pub fn block_reads(&self, blocked: bool) {
        self.reads_blocked.set(blocked);
    }

    pub fn block_writes(&self, blocked: bool) {
        self.writes_blocked.set(blocked);
    }

    /// Cap on the total bytes of keys and values; `None` removes the cap.
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota_bytes.set(bytes);
    }

    /// Store `value` directly, bypassing blocks and quota.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn used_bytes_with(&self, key: &str, value: &str) -> usize {
        let values = self.values.borrow();
        let others: usize = values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.reads_blocked.get() {
            return Err(StorageError::Unavailable("reads are blocked".to_string()));
        }
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.writes_blocked.get() {
            return Err(StorageError::Unavailable("writes are blocked".to_string()));
        }
        if let Some(limit) = self.quota_bytes.get()
            && self.used_bytes_with(key, value) > limit
        {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Keeps all keys in one JSON object on disk.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    /// `$HOME/.config/memory-cards/storage.json`, when `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join(STORE_DIR_NAME)
                .join(STORE_FILE_NAME),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_atomic(&self, data: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        let data = serde_json::to_string_pretty(&values)?;
        self.write_atomic(&data)?;
        debug!(path = %self.path.display(), key, "stored value");
        Ok(())
    }
}
