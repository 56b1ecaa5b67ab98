//! In-memory cache backend for tests

use crate::storage::traits::{CacheStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Database("memory cache lock poisoned".to_string())
}

impl CacheStore for MemoryCache {
    fn get(&self, fingerprint: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(fingerprint).cloned())
    }

    fn put(&self, fingerprint: &str, _url: &str, payload: &[u8]) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries
            .entry(fingerprint.to_string())
            .or_insert_with(|| payload.to_vec());
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_wins() {
        let cache = MemoryCache::new();
        cache.put("fp", "u", b"one").unwrap();
        cache.put("fp", "u", b"two").unwrap();

        assert_eq!(cache.get("fp").unwrap(), Some(b"one".to_vec()));
        assert_eq!(cache.len().unwrap(), 1);
    }
}
