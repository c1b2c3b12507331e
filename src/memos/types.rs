//! Memo types
//!
//! The persisted layout matches `memos.json`: `{ id, title, content, userId }`.

use crate::auth::guard::Owned;
use crate::auth::types::UserId;
use crate::store::Record;
use serde::{Deserialize, Serialize};

/// A memo as persisted in `memos.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Lookup key of the owning user
    #[serde(rename = "userId")]
    pub owner_id: UserId,
}

impl Memo {
    /// New memo with a fresh id
    pub fn new(draft: MemoDraft, owner_id: UserId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: draft.title,
            content: draft.content,
            owner_id,
        }
    }

    /// Case-insensitive substring match on title or content
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }
}

impl Record for Memo {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Memo {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// Title and content submitted by the create and edit forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Query string of the memo list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub auth_error: Option<String>,
}

impl ListQuery {
    /// True when the list was reached through an ownership redirect
    pub fn has_auth_error(&self) -> bool {
        self.auth_error.as_deref() == Some("true")
    }
}

/// Memo list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoList {
    pub memos: Vec<Memo>,
    pub auth_error: bool,
}
