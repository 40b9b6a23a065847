use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::scan_attempt::ScanAttempt;

/// Storage key holding the serialized history
pub const HISTORY_KEY: &str = "scan_history";

/// Most recent attempts kept; older ones are dropped on append
pub const HISTORY_CAPACITY: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("History lock poisoned")]
    Poisoned,
}

/// String key/value persistence the history is written through
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError>;
    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError>;
    fn remove(&self, key: &str) -> Result<(), HistoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError> {
        let entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().map_err(|_| HistoryError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, HistoryError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), HistoryError> {
        // Write-then-rename so a crash never leaves a truncated file behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), HistoryError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bounded, most-recent-first log of scan attempts.
///
/// Appends inside one process are serialized; writers in other processes
/// sharing the same storage race and the last write wins.
pub struct ScanHistory {
    storage: Arc<dyn KeyValueStorage>,
    write_lock: Mutex<()>,
}

impl ScanHistory {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Most recent first. Unreadable stored data counts as an empty log;
    /// the next append overwrites it.
    pub fn list(&self) -> Result<Vec<ScanAttempt>, HistoryError> {
        let raw = match self.storage.get(HISTORY_KEY)? {
            Some(raw) => raw,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str(&raw) {
            Ok(attempts) => Ok(attempts),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable scan history");
                Ok(Vec::new())
            }
        }
    }

    pub fn append(&self, attempt: ScanAttempt) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().map_err(|_| HistoryError::Poisoned)?;

        let mut attempts = self.list()?;

        attempts.insert(0, attempt);
        attempts.truncate(HISTORY_CAPACITY);

        self.storage
            .set(HISTORY_KEY, &serde_json::to_string(&attempts)?)
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().map_err(|_| HistoryError::Poisoned)?;
        self.storage.remove(HISTORY_KEY)?;
        tracing::info!("Scan history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(n: usize) -> ScanAttempt {
        ScanAttempt::succeeded(&format!("STK-{:03}", n), Some(format!("veh_{}", n)))
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let history = ScanHistory::in_memory();
        history.append(attempt(1)).unwrap();
        history.append(attempt(2)).unwrap();

        let codes: Vec<String> = history.list().unwrap().into_iter().map(|a| a.code).collect();
        assert_eq!(codes, vec!["STK-002", "STK-001"]);
    }

    #[test]
    fn test_full_history_evicts_exactly_the_oldest() {
        let history = ScanHistory::in_memory();
        for n in 1..=HISTORY_CAPACITY {
            history.append(attempt(n)).unwrap();
        }

        let before = history.list().unwrap();
        assert_eq!(before.len(), HISTORY_CAPACITY);
        let oldest = before.last().unwrap().clone();

        history.append(attempt(HISTORY_CAPACITY + 1)).unwrap();

        let after = history.list().unwrap();
        assert_eq!(after.len(), HISTORY_CAPACITY);
        assert!(!after.contains(&oldest));
        assert_eq!(after[1..], before[..HISTORY_CAPACITY - 1]);
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let history = ScanHistory::in_memory();
        for n in 0..250 {
            history.append(attempt(n)).unwrap();
            assert!(history.list().unwrap().len() <= HISTORY_CAPACITY);
        }
    }

    #[test]
    fn test_clear_removes_key() {
        let storage = Arc::new(MemoryStorage::new());
        let history = ScanHistory::new(storage.clone());
        history.append(attempt(1)).unwrap();
        assert!(storage.get(HISTORY_KEY).unwrap().is_some());

        history.clear().unwrap();

        assert!(history.list().unwrap().is_empty());
        assert!(storage.get(HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear_on_empty_history() {
        let history = ScanHistory::in_memory();
        history.clear().unwrap();
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_history_reads_empty_until_replaced() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(HISTORY_KEY, "{not json").unwrap();

        let history = ScanHistory::new(storage);
        assert!(history.list().unwrap().is_empty());

        history.append(attempt(7)).unwrap();
        let attempts = history.list().unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].code, "STK-007");
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let history = ScanHistory::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
        history.append(attempt(1)).unwrap();
        history.append(ScanAttempt::failed("ABC123", "Network error")).unwrap();

        let reopened = ScanHistory::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
        let attempts = reopened.list().unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].code, "ABC123");
        assert!(!attempts[0].success);
    }

    #[test]
    fn test_file_storage_clear_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let history = ScanHistory::new(Arc::new(storage.clone()));

        history.append(attempt(1)).unwrap();
        assert!(dir.path().join("scan_history.json").exists());

        history.clear().unwrap();
        assert!(!dir.path().join("scan_history.json").exists());
        assert!(storage.get(HISTORY_KEY).unwrap().is_none());
    }
}
