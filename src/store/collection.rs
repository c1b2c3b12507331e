//! Serialized read-modify-write over a record store
//!
//! A bare load/transform/save sequence races: two writers that load the same
//! snapshot each save their own version and the later save silently drops the
//! earlier change. `Collection` holds a per-collection writer lock across the
//! whole cycle, so within one process every mutation observes the result of
//! the previous one.
//!
//! One `Collection` must own each backing file. Writers in other processes
//! are not coordinated.

use crate::error::{Error, Result};
use crate::store::{JsonFileStore, MemoryStore, Record, RecordStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a transaction wants done with the transformed collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write<R> {
    /// Persist the transformed collection, then return the value
    Commit(R),
    /// Leave the backing store untouched and return the value
    Discard(R),
}

/// A named collection with serialized mutations
pub struct Collection<T: Record> {
    name: String,
    backend: Arc<dyn RecordStore<T>>,
    writer: Mutex<()>,
}

impl<T: Record> Collection<T> {
    /// Wrap an existing backend
    pub fn new(name: impl Into<String>, backend: Arc<dyn RecordStore<T>>) -> Self {
        Self {
            name: name.into(),
            backend,
            writer: Mutex::new(()),
        }
    }

    /// Open a JSON file backed collection, bootstrapping the file if missing
    pub async fn open_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let store = JsonFileStore::<T>::open(path).await?;
        Ok(Self::new(name, Arc::new(store)))
    }

    /// Empty in-memory collection
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(MemoryStore::<T>::new()))
    }

    /// Read every record in stored order
    pub async fn load_all(&self) -> Result<Vec<T>> {
        self.backend.load_all().await
    }

    /// Look up a single record by id
    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load_all().await?.into_iter().find(|r| r.id() == id))
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.load_all().await?.len())
    }

    /// Run `f` against a fresh snapshot while holding the writer lock.
    ///
    /// The snapshot is saved only when `f` returns [`Write::Commit`]. An error
    /// from `f` aborts without writing.
    pub async fn transact<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<Write<R>> + Send,
        R: Send,
    {
        let _guard = self.writer.lock().await;

        let mut records = self.backend.load_all().await?;
        match f(&mut records)? {
            Write::Commit(value) => {
                self.backend.save_all(&records).await?;
                Ok(value)
            }
            Write::Discard(value) => Ok(value),
        }
    }

    /// Append a new record. Fails with `DuplicateId` if the id is taken.
    pub async fn create(&self, record: T) -> Result<T> {
        let created = self
            .transact(move |records| {
                if records.iter().any(|r| r.id() == record.id()) {
                    return Err(Error::DuplicateId(record.id().to_string()));
                }
                records.push(record.clone());
                Ok(Write::Commit(record))
            })
            .await?;
        tracing::debug!(collection = %self.name, id = %created.id(), "Created record");
        Ok(created)
    }

    /// Apply `f` to the record with `id` in place. Returns `None` without
    /// writing when no such record exists.
    pub async fn update<F>(&self, id: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T) + Send,
    {
        self.transact(|records| match records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                f(record);
                Ok(Write::Commit(Some(record.clone())))
            }
            None => Ok(Write::Discard(None)),
        })
        .await
    }

    /// Remove the record with `id`, keeping the order of the rest
    pub async fn remove(&self, id: &str) -> Result<Option<T>> {
        self.transact(|records| match records.iter().position(|r| r.id() == id) {
            Some(index) => Ok(Write::Commit(Some(records.remove(index)))),
            None => Ok(Write::Discard(None)),
        })
        .await
    }

    /// Where the collection lives, for logs
    pub fn location(&self) -> String {
        self.backend.describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        value: u32,
    }

    impl Record for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str, value: u32) -> Item {
        Item {
            id: id.to_string(),
            value,
        }
    }

    async fn file_collection(dir: &TempDir) -> Collection<Item> {
        Collection::open_file("items", dir.path().join("items.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_appends_in_order() {
        let col = Collection::<Item>::in_memory("items");
        col.create(item("b", 1)).await.unwrap();
        col.create(item("a", 2)).await.unwrap();
        col.create(item("c", 3)).await.unwrap();

        let ids: Vec<String> = col.load_all().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_create_duplicate_id_rejected() {
        let col = Collection::<Item>::in_memory("items");
        col.create(item("x", 1)).await.unwrap();

        let err = col.create(item("x", 99)).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateId(id) if id == "x"));
        assert_eq!(col.find("x").await.unwrap().unwrap().value, 1);
        assert_eq!(col.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let dir = TempDir::new().unwrap();
        let col = file_collection(&dir).await;
        col.create(item("a", 1)).await.unwrap();
        col.create(item("b", 2)).await.unwrap();
        col.create(item("c", 3)).await.unwrap();

        let updated = col.update("b", |i| i.value = 20).await.unwrap().unwrap();
        assert_eq!(updated.value, 20);
        assert!(col.update("missing", |i| i.value = 0).await.unwrap().is_none());

        let removed = col.remove("a").await.unwrap().unwrap();
        assert_eq!(removed.id, "a");
        assert!(col.remove("a").await.unwrap().is_none());

        let all = col.load_all().await.unwrap();
        assert_eq!(all, vec![item("b", 20), item("c", 3)]);
    }

    #[tokio::test]
    async fn test_discard_leaves_file_bytes_unchanged() {
        let dir = TempDir::new().unwrap();
        let col = file_collection(&dir).await;
        col.create(item("a", 1)).await.unwrap();
        let path = dir.path().join("items.json");
        let before = std::fs::read(&path).unwrap();

        let out = col
            .transact(|records| {
                records.clear();
                Ok(Write::Discard("kept"))
            })
            .await
            .unwrap();

        assert_eq!(out, "kept");
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_error_in_transaction_aborts_write() {
        let col = Collection::<Item>::in_memory("items");
        col.create(item("a", 1)).await.unwrap();

        let result: Result<()> = col
            .transact(|records| {
                records.push(item("b", 2));
                Err(Error::Internal("boom".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(col.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let col = Arc::new(file_collection(&dir).await);

        let tasks = (0..32).map(|n| {
            let col = col.clone();
            tokio::spawn(async move { col.create(item(&format!("item-{}", n), n)).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(col.len().await.unwrap(), 32);
    }

    #[tokio::test]
    async fn test_concurrent_updates_all_applied() {
        let col = Arc::new(Collection::<Item>::in_memory("items"));
        col.create(item("counter", 0)).await.unwrap();

        let tasks = (0..50).map(|_| {
            let col = col.clone();
            tokio::spawn(async move { col.update("counter", |i| i.value += 1).await })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(col.find("counter").await.unwrap().unwrap().value, 50);
    }
}
