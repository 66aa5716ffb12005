//! Storage layer for crudform.
//!
//! The record collection lives as one serialized value under one key of a
//! simple key-value area. [`KeyValueStore`] is that area; it is injected into
//! [`RecordStore`] so tests can swap the `SQLite` backend for
//! [`MemoryKeyValueStore`].

pub mod migrations;
mod records;
pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use records::{RecordStore, StoreStats, DEFAULT_COLLECTION_KEY};

/// A persistent string key-value area.
///
/// Every operation suspends only the caller until the backend finishes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    async fn remove_item(&self, key: &str) -> Result<bool>;

    /// When `key` was last written, if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn modified_at(&self, key: &str) -> Result<Option<DateTime<Utc>>>;
}

/// `SQLite`-backed key-value area.
///
/// The connection is shared behind a mutex and every query runs on tokio's
/// blocking pool.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            f(&guard)
        })
        .await?
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::internal("storage lock poisoned"))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_items WHERE key = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                r"
                INSERT OR REPLACE INTO kv_items (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| Error::storage_write(&key, e.to_string()))?;
            debug!(key = %key, bytes = value.len(), "Stored item");
            Ok(())
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let affected = conn
                .execute("DELETE FROM kv_items WHERE key = ?1", [&key])
                .map_err(|e| Error::storage_write(&key, e.to_string()))?;
            Ok(affected > 0)
        })
        .await
    }

    async fn modified_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let stamp: Option<String> = conn
                .query_row(
                    "SELECT updated_at FROM kv_items WHERE key = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(stamp
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)))
        })
        .await
    }
}

/// In-memory key-value area.
///
/// Clones share the same map. Reads and writes can be made to fail on
/// demand to exercise error handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    items: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one raw value.
    #[must_use]
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut items) = store.items.lock() {
            items.insert(key.into(), (value.into(), Utc::now()));
        }
        store
    }

    /// Make every subsequent read fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw value under `key`, bypassing failure injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .ok()
            .and_then(|items| items.get(key).map(|(value, _)| value.clone()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::internal(format!("read of '{key}' failed")));
        }
        let items = lock(&self.items)?;
        Ok(items.get(key).map(|(value, _)| value.clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage_write(key, "write rejected"));
        }
        let mut items = lock(&self.items)?;
        items.insert(key.to_string(), (value.to_string(), Utc::now()));
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage_write(key, "write rejected"));
        }
        let mut items = lock(&self.items)?;
        Ok(items.remove(key).is_some())
    }

    async fn modified_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let items = lock(&self.items)?;
        Ok(items.get(key).map(|(_, stamp)| *stamp))
    }
}
