//! JSON file backend
//!
//! Layout: one file per collection holding a pretty-printed JSON array.
//! Writes go to a sibling temp file that is renamed over the target, so a
//! reader never observes a half-written collection.

use crate::error::{Error, Result};
use crate::store::{bootstrap, Record, RecordStore};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Collection persisted as a single JSON array file
pub struct JsonFileStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileStore<T> {
    /// Open the collection at `path`, bootstrapping an empty file if needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        bootstrap::ensure_exists(&path).await?;
        Ok(Self {
            path,
            _record: PhantomData,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("collection");
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for JsonFileStore<T> {
    async fn load_all(&self) -> Result<Vec<T>> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::StorageUnavailable(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let records: Vec<T> = serde_json::from_slice(&data).map_err(|e| {
            Error::StorageUnavailable(format!("cannot parse {}: {}", self.path.display(), e))
        })?;
        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            "Loaded collection"
        );
        Ok(records)
    }

    async fn save_all(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.temp_path();

        if let Err(e) = tokio::fs::write(&tmp, json.as_bytes()).await {
            return Err(Error::StorageUnavailable(format!(
                "cannot write {}: {}",
                tmp.display(),
                e
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::StorageUnavailable(format!(
                "cannot replace {}: {}",
                self.path.display(),
                e
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            count = records.len(),
            "Saved collection"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        body: String,
    }

    impl Record for Note {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_bootstraps_empty_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::<Note>::open(dir.path().join("notes.json"))
            .await
            .unwrap();
        assert!(store.path().exists());
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::<Note>::open(dir.path().join("notes.json"))
            .await
            .unwrap();

        let notes = vec![note("c", "third"), note("a", "first"), note("b", "second")];
        store.save_all(&notes).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, notes);

        // save_all(load_all()) is a no-op on contents
        let before = std::fs::read(store.path()).unwrap();
        store.save_all(&loaded).await.unwrap();
        let after = std::fs::read(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_pretty_printed_layout() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::<Note>::open(dir.path().join("notes.json"))
            .await
            .unwrap();
        store.save_all(&[note("n1", "hello")]).await.unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n  {"));
        assert!(text.contains("\"id\": \"n1\""));
    }

    #[tokio::test]
    async fn test_malformed_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = JsonFileStore::<Note>::open(&path).await.unwrap();
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_deleted_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::<Note>::open(dir.path().join("notes.json"))
            .await
            .unwrap();
        std::fs::remove_file(store.path()).unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::<Note>::open(dir.path().join("notes.json"))
            .await
            .unwrap();
        store.save_all(&[note("a", "x")]).await.unwrap();
        store.save_all(&[note("b", "y")]).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["notes.json".to_string()]);
    }
}
