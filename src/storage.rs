//! Durable cache for the transaction count
//!
//! A single key persisted as JSON. The ledger stays the source of truth; the
//! cached value only seeds the count until the first refresh completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::StorageError;

const COUNT_FILE: &str = "transaction_count.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCount {
    pub transaction_count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    /// Create storage rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn count_path(&self) -> PathBuf {
        self.base_path.join(COUNT_FILE)
    }

    /// Load the cached count, or `None` if nothing has been cached yet
    pub fn load_transaction_count(&self) -> Result<Option<u64>, StorageError> {
        let path = self.count_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let cached: CachedCount = serde_json::from_str(&contents)?;
        Ok(Some(cached.transaction_count))
    }

    /// Persist the count, replacing any previous value
    pub fn save_transaction_count(&self, count: u64) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let cached = CachedCount {
            transaction_count: count,
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&cached)?;
        fs::write(self.count_path(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_cache_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path());
        assert_eq!(storage.load_transaction_count().unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nested"));

        storage.save_transaction_count(3).unwrap();
        storage.save_transaction_count(4).unwrap();

        assert_eq!(storage.load_transaction_count().unwrap(), Some(4));
    }

    #[test]
    fn test_corrupt_cache_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(COUNT_FILE), "not json").unwrap();
        let storage = Storage::new(dir.path());
        assert!(matches!(
            storage.load_transaction_count(),
            Err(StorageError::Json(_))
        ));
    }
}
