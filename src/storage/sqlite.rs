//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the CacheStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CacheStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite cache backend
///
/// The connection sits behind a mutex so the cache can be shared by every
/// worker task.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens or creates the cache database at `path`
    ///
    /// Missing parent directories are created.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA mmap_size = 268435456;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("cache connection lock poisoned".to_string()))
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, fingerprint: &str) -> StorageResult<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM responses WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn put(&self, fingerprint: &str, url: &str, payload: &[u8]) -> StorageResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        // First write wins; a cached response is never replaced
        conn.execute(
            "INSERT OR IGNORE INTO responses (fingerprint, url, payload, fetched_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![fingerprint, url, payload, now],
        )?;
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
