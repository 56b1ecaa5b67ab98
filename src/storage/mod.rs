//! Storage module for persisting crawl data
//!
//! This module handles everything the crawl keeps on disk:
//! - The permanent request/response cache (SQLite, or in memory for tests)
//! - Request fingerprinting
//! - The JSON results file, which doubles as the seed list

mod memory;
mod results;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryCache;
pub use results::{load_results, save_results};
pub use sqlite::SqliteCache;
pub use traits::{CacheStore, StorageError, StorageResult};

use sha2::{Digest, Sha256};
use std::path::Path;

/// Opens (or creates) the on-disk response cache
pub fn open_cache(path: &Path) -> StorageResult<SqliteCache> {
    SqliteCache::new(path)
}

/// Stable fingerprint of a fully-resolved request URL
///
/// # Returns
///
/// The hex-encoded SHA-256 digest of the URL (64 characters)
pub fn fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
