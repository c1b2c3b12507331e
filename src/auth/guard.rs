//! Ownership guard
//!
//! Decides whether an authenticated user may mutate a record. The three
//! outcomes stay distinct: callers redirect on a mismatch but report a missing
//! record as not found.

use crate::auth::types::UserId;
use crate::store::Record;

/// A record that belongs to a user
pub trait Owned: Record {
    fn owner_id(&self) -> &UserId;
}

/// Result of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The user owns the record at this index
    Allow(usize),
    /// The record exists but belongs to someone else
    OwnerMismatch,
    /// No record with the requested id
    NotFound,
}

/// Check `user` against the owner of the record with `id`
pub fn authorize<T: Owned>(records: &[T], id: &str, user: &UserId) -> Access {
    match records.iter().position(|r| r.id() == id) {
        None => Access::NotFound,
        Some(index) if records[index].owner_id() == user => Access::Allow(index),
        Some(_) => Access::OwnerMismatch,
    }
}
