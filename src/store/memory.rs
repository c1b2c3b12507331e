//! In-memory backend, used by tests and ephemeral deployments

use crate::error::Result;
use crate::store::{Record, RecordStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Collection held entirely in process memory
pub struct MemoryStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn load_all(&self) -> Result<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn save_all(&self, records: &[T]) -> Result<()> {
        *self.records.write().await = records.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
