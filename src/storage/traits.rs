//! Storage traits and error types
//!
//! This module defines the trait interface for cache backends and
//! associated error types.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A permanent, content-addressed response store
///
/// Entries are keyed by a request fingerprint and never expire. Implementations
/// must be safe to share between worker tasks.
pub trait CacheStore: Send + Sync {
    /// Returns the stored payload for `fingerprint`, if any
    fn get(&self, fingerprint: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `payload` under `fingerprint`
    ///
    /// # Arguments
    ///
    /// * `fingerprint` - Request fingerprint (see [`crate::storage::fingerprint`])
    /// * `url` - The request URL, kept for inspection only
    /// * `payload` - Raw response bytes
    fn put(&self, fingerprint: &str, url: &str, payload: &[u8]) -> StorageResult<()>;

    /// Number of stored responses
    fn len(&self) -> StorageResult<u64>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
