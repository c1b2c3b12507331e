//! Memopad - multi-user memo service with cookie sessions
//!
//! Users register and log in with a username and password; a signed session
//! token in the `token` cookie identifies them afterwards. Everyone can read
//! and search every memo, but only a memo's owner may edit or delete it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         HTTP (axum)                          │
//! │   /users/*  ──▶ auth::handler      /memos/* ──▶ memos::handler│
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │                              │
//!   ┌─────────────▼────────────┐   ┌─────────────▼──────────────┐
//!   │ CredentialStore (Argon2) │   │ MemoService                │
//!   │ TokenService (HS256)     │◀──│  authenticate ▶ authorize  │
//!   └─────────────┬────────────┘   │  ▶ execute (pipeline)      │
//!                 │                └─────────────┬──────────────┘
//!   ┌─────────────▼──────────────────────────────▼──────────────┐
//!   │        Collection<T>: serialized read-modify-write        │
//!   │        JsonFileStore (users.json, memos.json)             │
//!   └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`]: Application state and the merged router
//! - [`auth`]: Credentials, session tokens, ownership guard, user routes
//! - [`memos`]: Memo types, service and routes
//! - [`pipeline`]: Request stages shared by mutating operations
//! - [`store`]: Record collections and their JSON file backend
//! - [`config`]: Configuration management

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod memos;
pub mod pipeline;
pub mod store;

pub use config::MemopadConfig;
pub use error::{Error, Result};
