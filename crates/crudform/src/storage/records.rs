//! The record collection on top of a [`KeyValueStore`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::KeyValueStore;
use crate::error::{Error, Result};
use crate::record::{Record, RecordId};

/// Default key the collection is stored under.
pub const DEFAULT_COLLECTION_KEY: &str = "@crud_form:usuario";

/// Reads and writes the whole record collection under a single key.
///
/// There is no locking: one logical writer is assumed at a time.
#[derive(Debug, Clone)]
pub struct RecordStore<S> {
    store: S,
    key: String,
}

/// Summary of the stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Key the collection lives under.
    pub collection_key: String,
    /// Backend the key-value area uses.
    pub backend: &'static str,
    /// Number of records in the collection.
    pub total_records: usize,
    /// When the collection was last written.
    pub last_modified: Option<DateTime<Utc>>,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Wrap a key-value store using [`DEFAULT_COLLECTION_KEY`].
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_COLLECTION_KEY)
    }

    /// Wrap a key-value store using a custom collection key.
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The collection key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying key-value store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Load the whole collection.
    ///
    /// Never fails: a missing, unreadable or unparsable collection is logged
    /// and reported as empty.
    pub async fn load_all(&self) -> Vec<Record> {
        match self.try_load_all().await {
            Ok(records) => records,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load collection, treating as empty");
                Vec::new()
            }
        }
    }

    /// Load the whole collection, reporting read and parse failures.
    ///
    /// A missing key is an empty collection, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails or the stored value is not
    /// a valid collection.
    pub async fn try_load_all(&self) -> Result<Vec<Record>> {
        let Some(raw) = self.store.get_item(&self.key).await? else {
            debug!(key = %self.key, "No collection stored yet");
            return Ok(Vec::new());
        };
        let records: Vec<Record> = serde_json::from_str(&raw)?;
        debug!(key = %self.key, count = records.len(), "Loaded collection");
        Ok(records)
    }

    /// Replace the stored collection with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails. The
    /// collection is then not guaranteed to be persisted.
    #[instrument(skip(self, records), fields(key = %self.key, count = records.len()))]
    pub async fn save_all(&self, records: &[Record]) -> Result<()> {
        let raw = serde_json::to_string(records)?;
        self.store.set_item(&self.key, &raw).await?;
        debug!("Saved collection");
        Ok(())
    }

    /// Find one record by id.
    pub async fn get(&self, id: &RecordId) -> Option<Record> {
        self.load_all().await.into_iter().find(|r| &r.id == id)
    }

    /// Append a new record and rewrite the collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRecordId`] if the id is already stored, or
    /// any read, parse or write error. Nothing is written on error.
    pub async fn create(&self, record: Record) -> Result<Record> {
        let mut records = self.try_load_all().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(Error::DuplicateRecordId(record.id.clone()));
        }
        records.push(record.clone());
        self.save_all(&records).await?;
        info!(id = %record.id, "Record created");
        Ok(record)
    }

    /// Replace the stored record with the same id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has that id, or any
    /// read, parse or write error.
    pub async fn update(&self, record: Record) -> Result<Record> {
        let mut records = self.try_load_all().await?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::RecordNotFound(record.id.clone()))?;
        *slot = record.clone();
        self.save_all(&records).await?;
        info!(id = %record.id, "Record updated");
        Ok(record)
    }

    /// Remove the record with `id`. Returns `true` if one was removed.
    ///
    /// # Errors
    ///
    /// Returns any read, parse or write error.
    pub async fn delete(&self, id: &RecordId) -> Result<bool> {
        let mut records = self.try_load_all().await?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save_all(&records).await?;
        info!(id = %id, "Record deleted");
        Ok(true)
    }

    /// Drop the whole collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn clear(&self) -> Result<bool> {
        self.store.remove_item(&self.key).await
    }

    /// Summarize the stored collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot report its modification time.
    pub async fn stats(&self) -> Result<StoreStats> {
        let total_records = self.load_all().await.len();
        let last_modified = self.store.modified_at(&self.key).await?;
        Ok(StoreStats {
            collection_key: self.key.clone(),
            backend: self.store.backend_name(),
            total_records,
            last_modified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryKeyValueStore, SqliteKeyValueStore};

    fn memory_store() -> RecordStore<MemoryKeyValueStore> {
        RecordStore::new(MemoryKeyValueStore::new())
    }

    fn ana() -> Record {
        Record::new("Ana", "ana@x.com", "123456", "123456")
    }

    #[tokio::test]
    async fn test_empty_storage_loads_empty() {
        let store = memory_store();
        assert!(store.load_all().await.is_empty());
        assert!(store.try_load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let store = memory_store();
        let mut bruno = Record::new("Bruno", "bruno@x.com", "abcdef", "abcdef");
        bruno.cep = Some("01001000".to_string());
        bruno.cidade = Some("São Paulo".to_string());
        let records = vec![ana(), bruno];

        store.save_all(&records).await.unwrap();
        assert_eq!(store.load_all().await, records);
    }

    #[tokio::test]
    async fn test_save_all_replaces_previous_contents() {
        let store = memory_store();
        store.save_all(&[ana(), ana()]).await.unwrap();
        let only = vec![ana()];
        store.save_all(&only).await.unwrap();
        assert_eq!(store.load_all().await, only);
    }

    #[tokio::test]
    async fn test_unparsable_collection_loads_empty() {
        let store = RecordStore::new(MemoryKeyValueStore::with_item(
            DEFAULT_COLLECTION_KEY,
            "{not json",
        ));
        assert!(store.load_all().await.is_empty());
        assert!(matches!(
            store.try_load_all().await.unwrap_err(),
            Error::Json(_)
        ));
    }

    #[tokio::test]
    async fn test_read_failure_loads_empty() {
        let kv = MemoryKeyValueStore::new();
        let store = RecordStore::new(kv.clone());
        store.save_all(&[ana()]).await.unwrap();

        kv.set_fail_reads(true);
        assert!(store.load_all().await.is_empty());
        assert!(store.try_load_all().await.is_err());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let kv = MemoryKeyValueStore::new();
        kv.set_fail_writes(true);
        let store = RecordStore::new(kv);

        let err = store.save_all(&[ana()]).await.unwrap_err();
        assert!(matches!(err, Error::StorageWrite { .. }));
        assert!(store.create(ana()).await.is_err());
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_appends_in_order() {
        let store = memory_store();
        let first = store.create(ana()).await.unwrap();
        let second = store
            .create(Record::new("Bruno", "bruno@x.com", "abcdef", "abcdef"))
            .await
            .unwrap();

        let all = store.load_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let store = memory_store();
        let record = store.create(ana()).await.unwrap();

        let err = store.create(record.clone()).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateRecordId(id) if id == record.id));
        assert_eq!(store.load_all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_does_not_overwrite_corrupt_collection() {
        let kv = MemoryKeyValueStore::with_item(DEFAULT_COLLECTION_KEY, "garbage");
        let store = RecordStore::new(kv.clone());

        assert!(store.create(ana()).await.is_err());
        assert_eq!(kv.raw(DEFAULT_COLLECTION_KEY).as_deref(), Some("garbage"));
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let store = memory_store();
        let a = store.create(ana()).await.unwrap();
        let b = store
            .create(Record::new("Bruno", "bruno@x.com", "abcdef", "abcdef"))
            .await
            .unwrap();

        let mut edited = a.clone();
        edited.nome = "Ana Maria".to_string();
        store.update(edited).await.unwrap();

        let all = store.load_all().await;
        assert_eq!(all[0].id, a.id);
        assert_eq!(all[0].nome, "Ana Maria");
        assert_eq!(all[1], b);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = memory_store();
        let err = store.update(ana()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let store = memory_store();
        let a = store.create(ana()).await.unwrap();
        let b = store
            .create(Record::new("Bruno", "bruno@x.com", "abcdef", "abcdef"))
            .await
            .unwrap();

        assert!(store.delete(&a.id).await.unwrap());
        assert!(!store.delete(&a.id).await.unwrap());
        assert_eq!(store.load_all().await, vec![b]);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = memory_store();
        let a = store.create(ana()).await.unwrap();

        assert_eq!(store.get(&a.id).await, Some(a));
        assert!(store.get(&RecordId::generate()).await.is_none());
    }

    #[tokio::test]
    async fn test_custom_key_and_clear() {
        let kv = MemoryKeyValueStore::new();
        let store = RecordStore::with_key(kv.clone(), "custom");
        store.create(ana()).await.unwrap();

        assert_eq!(store.key(), "custom");
        assert!(kv.raw("custom").is_some());
        assert!(kv.raw(DEFAULT_COLLECTION_KEY).is_none());

        assert!(store.clear().await.unwrap());
        assert!(store.load_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = memory_store();
        let empty = store.stats().await.unwrap();
        assert_eq!(empty.total_records, 0);
        assert!(empty.last_modified.is_none());
        assert_eq!(empty.backend, "memory");

        store.create(ana()).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 1);
        assert!(stats.last_modified.is_some());
        assert_eq!(stats.collection_key, DEFAULT_COLLECTION_KEY);
    }

    #[tokio::test]
    async fn test_mixed_id_collection_loads_and_edits() {
        let raw = r#"[
            {"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "nome": "Ana",
             "email": "ana@x.com", "senha": "123456", "confirmaSenha": "123456"},
            {"id": "abc", "nome": "Bruno",
             "email": "bruno@x.com", "senha": "abcdef", "confirmaSenha": "abcdef"},
            {"nome": "Carla",
             "email": "carla@x.com", "senha": "qwerty", "confirmaSenha": "qwerty"}
        ]"#;
        let store = RecordStore::new(MemoryKeyValueStore::with_item(DEFAULT_COLLECTION_KEY, raw));

        let all = store.load_all().await;
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].id.as_str(), "abc");
        assert!(all[2].id.is_empty());

        let mut bruno = all[1].clone();
        bruno.nome = "Bruno Silva".to_string();
        store.update(bruno).await.unwrap();
        let abc = RecordId::from("abc");
        assert_eq!(store.get(&abc).await.unwrap().nome, "Bruno Silva");
        assert!(store.delete(&abc).await.unwrap());

        let all = store.load_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].nome, "Ana");
        assert_eq!(all[1].nome, "Carla");
    }

    #[tokio::test]
    async fn test_sqlite_backend_round_trip() {
        let store = RecordStore::new(SqliteKeyValueStore::open_in_memory().unwrap());
        let records = vec![ana(), ana()];
        store.save_all(&records).await.unwrap();
        assert_eq!(store.load_all().await, records);
        assert_eq!(store.stats().await.unwrap().backend, "sqlite");
    }
}
