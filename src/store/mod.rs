//! Persistence collaborators invoked when a session finishes.
//!
//! Each store owns its format and swallows its own failures: a broken disk or
//! database is logged and the store keeps serving what it has in memory.

pub mod history;
pub mod leaderboard;
pub mod weak_keys;

use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use history::{HistoryEntry, TestHistory};
pub use leaderboard::{Leaderboard, LeaderboardEntry, PersonalBest, ScoreOutcome};
pub use weak_keys::{select_weak_keys, KeyRecord, WeakKeyDb, WeakKeyStat};

pub const HISTORY_KEY: &str = "typing-test-history";
pub const LEADERBOARD_KEY: &str = "typing-leaderboard";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed stored data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load/save of one value under one named key
pub trait Persist<T> {
    /// Stored value, or `T::default()` when nothing was saved yet
    fn load(&self) -> Result<T, StoreError>;
    fn save(&self, value: &T) -> Result<(), StoreError>;
    fn remove(&self) -> Result<(), StoreError>;
}

/// JSON file per key, `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn named<P: AsRef<Path>>(dir: P, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Persist<T> for JsonFileStore
where
    T: Serialize + DeserializeOwned + Default,
{
    fn load(&self) -> Result<T, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(value)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-memory persistence, for tests and for running without a writable disk
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    value: RefCell<Option<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            value: RefCell::new(None),
        }
    }
}

impl<T: Clone + Default> Persist<T> for MemoryStore<T> {
    fn load(&self) -> Result<T, StoreError> {
        Ok(self.value.borrow().clone().unwrap_or_default())
    }

    fn save(&self, value: &T) -> Result<(), StoreError> {
        *self.value.borrow_mut() = Some(value.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        *self.value.borrow_mut() = None;
        Ok(())
    }
}

/// Load through `persist`, falling back to the default on failure
pub(crate) fn load_or_default<T: Default, P: Persist<T>>(persist: &P, what: &str) -> T {
    persist.load().unwrap_or_else(|e| {
        tracing::warn!(store = what, error = %e, "failed to load, starting empty");
        T::default()
    })
}

/// Save through `persist`, logging on failure
pub(crate) fn save_logged<T, P: Persist<T>>(persist: &P, value: &T, what: &str) {
    if let Err(e) = persist.save(value) {
        tracing::warn!(store = what, error = %e, "failed to save");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Persistence whose disk is always broken
    #[derive(Debug, Default)]
    pub struct BrokenStore;

    impl<T> Persist<T> for BrokenStore {
        fn load(&self) -> Result<T, StoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage unavailable").into())
        }

        fn save(&self, _value: &T) -> Result<(), StoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage unavailable").into())
        }

        fn remove(&self) -> Result<(), StoreError> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "storage unavailable").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn json_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::named(dir.path(), "numbers");

        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);
        store.save(&value).unwrap();

        let loaded: BTreeMap<String, u32> = store.load().unwrap();
        assert_eq!(loaded, value);
        assert!(store.path().ends_with("numbers.json"));
    }

    #[test]
    fn json_store_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::named(dir.path().join("nested"), "nothing");
        let loaded: Vec<u32> = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn json_store_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::named(dir.path(), "bad");
        fs::write(store.path(), b"{not json").unwrap();

        let result: Result<Vec<u32>, _> = store.load();
        assert!(matches!(result, Err(StoreError::Json(_))));
        let fallback: Vec<u32> = load_or_default(&store, "bad");
        assert!(fallback.is_empty());
    }

    #[test]
    fn json_store_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::named(dir.path(), "gone");
        Persist::<Vec<u32>>::save(&store, &vec![1, 2]).unwrap();
        Persist::<Vec<u32>>::remove(&store).unwrap();
        Persist::<Vec<u32>>::remove(&store).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::<Vec<u32>>::new();
        assert!(store.load().unwrap().is_empty());
        store.save(&vec![3]).unwrap();
        assert_eq!(store.load().unwrap(), vec![3]);
        store.remove().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
