//! Record store — whole-collection persistence without a database engine
//!
//! Every collection is an ordered JSON array that is read in full, transformed
//! in memory, and written back in full. Backends implement [`RecordStore`];
//! [`Collection`] layers the serialized read-modify-write cycle on top.
//!
//! ```text
//! Collection<T> ──lock──▶ load_all() ──▶ transform(&mut Vec<T>) ──▶ save_all()
//!                                 │                                   ▲
//!                                 └──────── Write::Discard ───────────┘ (skipped)
//! ```

pub mod bootstrap;
pub mod collection;
pub mod file;
pub mod memory;

pub use bootstrap::ensure_exists;
pub use collection::{Collection, Write};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A persisted record with a collection-unique id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// Backend for a single collection.
///
/// Implementations must replace the whole collection on `save_all` so that a
/// following `load_all` observes either the old or the new contents, never a
/// mix of both.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Read the entire collection in stored order
    async fn load_all(&self) -> Result<Vec<T>>;

    /// Overwrite the entire collection
    async fn save_all(&self, records: &[T]) -> Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}
