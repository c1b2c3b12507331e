//! Memos module — memo CRUD scoped by ownership
//!
//! Provides the memo service (list/search, create, edit, delete) and its HTTP
//! routes under `/memos`. Memos are persisted in `memos.json`.

pub mod handler;
pub mod service;
pub mod types;

pub use handler::{memos_router, MemosState};
pub use service::MemoService;
pub use types::{Memo, MemoDraft};
