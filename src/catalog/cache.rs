//! Key/value cache for catalog responses
//!
//! Entries expire by time only. Stores may fail; the client treats any
//! failure as a miss.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use thiserror::Error;

use crate::db::{Database, DbError};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Cache lock poisoned")]
    Poisoned,
}

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Cache rows in the `cache_entries` table
#[derive(Clone)]
pub struct SqliteCache {
    db: Database,
}

impl SqliteCache {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now().timestamp();
        let value = self.db.with_conn(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                    params![key, now],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Utc::now().timestamp();
        let expires_at = now + ttl.as_secs() as i64;
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", [now])?;
            conn.execute(
                r#"
                INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
                "#,
                params![key, value, expires_at],
            )?;
            Ok(())
        })?;
        Ok(())
    }
}

/// Process-local cache
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, i64)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now().timestamp();
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Utc::now().timestamp() + ttl.as_secs() as i64;
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}
