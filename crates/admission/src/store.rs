//! Persistence for admission statistics.
//!
//! The whole record is rewritten after every mutation. Writes are
//! synchronous so a dispatch is never counted before it is on disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use signalcast_core::StorageError;
use tracing::debug;

use crate::stats::AdmissionStatistics;

pub trait StatsStore: Send + Sync {
    fn name(&self) -> &str;

    /// Load the last saved record. A store with nothing saved yields the
    /// default record.
    fn load(&self) -> Result<AdmissionStatistics, StorageError>;

    fn save(&self, stats: &AdmissionStatistics) -> Result<(), StorageError>;
}

/// JSON file store, written via a temporary sibling and a rename.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

impl StatsStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    fn load(&self) -> Result<AdmissionStatistics, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AdmissionStatistics::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn save(&self, stats: &AdmissionStatistics) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(stats)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), posts_today = stats.posts_today, "Statistics saved");
        Ok(())
    }
}

/// Process-local store for tests and dry runs.
#[derive(Default)]
pub struct InMemoryStore {
    record: Mutex<Option<AdmissionStatistics>>,
    saves: Mutex<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(stats: AdmissionStatistics) -> Self {
        Self {
            record: Mutex::new(Some(stats)),
            saves: Mutex::new(0),
        }
    }

    /// Last saved record, if any.
    pub fn snapshot(&self) -> Option<AdmissionStatistics> {
        self.record.lock().ok().and_then(|r| r.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl StatsStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn load(&self) -> Result<AdmissionStatistics, StorageError> {
        Ok(self.snapshot().unwrap_or_default())
    }

    fn save(&self, stats: &AdmissionStatistics) -> Result<(), StorageError> {
        let mut record = self
            .record
            .lock()
            .map_err(|_| StorageError::Corrupt("in-memory store poisoned".into()))?;
        *record = Some(stats.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> AdmissionStatistics {
        AdmissionStatistics {
            day_key: NaiveDate::from_ymd_opt(2026, 10, 14),
            posts_today: 3,
            recent_post_times: vec![100.0, 200.5],
            last_interaction_time: Some(150.0),
        }
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("stats.json"));
        assert_eq!(store.load().unwrap(), AdmissionStatistics::default());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        JsonFileStore::new(&path).save(&sample()).unwrap();
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load().unwrap(), sample());
        assert!(!dir.path().join("nested").join("stats.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn in_memory_store_counts_saves() {
        let store = InMemoryStore::new();
        assert!(store.snapshot().is_none());
        store.save(&sample()).unwrap();
        store.save(&sample()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load().unwrap(), sample());
    }
}
