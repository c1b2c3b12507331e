//! Request pipeline
//!
//! Each mutating request runs through the same ordered stages:
//!
//! ```text
//! RequestContext ─▶ authenticate ─▶ authorize ─▶ execute ─▶ respond
//!                        │               │
//!                        └──── Rejection ┴──────────────────▶ respond
//! ```
//!
//! A stage either hands an enriched value to the next one or short-circuits
//! with a [`Rejection`]. Rejections are ordinary outcomes, not errors; only
//! storage failures travel as [`crate::Error`].

use crate::auth::guard::{self, Access, Owned};
use crate::auth::token::TokenService;
use crate::auth::types::UserId;

/// Everything a request brings with it before any stage has run
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: Option<String>,
}

impl RequestContext {
    /// A request without a session token
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Context after the authenticate stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub user_id: UserId,
}

/// Why a request stopped before executing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No token, or a token that does not verify
    Unauthenticated(String),
    /// The target record does not exist
    NotFound,
    /// The target record belongs to another user
    OwnerMismatch,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated(reason) => write!(f, "unauthenticated: {}", reason),
            Self::NotFound => write!(f, "not found"),
            Self::OwnerMismatch => write!(f, "owner mismatch"),
        }
    }
}

/// Outcome of a stage
pub type Verdict<T> = std::result::Result<T, Rejection>;

/// Stage 1: verify the session token
pub fn authenticate(ctx: &RequestContext, tokens: &TokenService) -> Verdict<Authenticated> {
    match tokens.verify(ctx.token()) {
        Ok(user_id) => Ok(Authenticated { user_id }),
        Err(e) if e.is_auth_failure() => Err(Rejection::Unauthenticated(e.to_string())),
        Err(e) => Err(Rejection::Unauthenticated(format!("token check failed: {}", e))),
    }
}

/// Stage 2: check ownership of the target record, yielding its index
pub fn authorize<T: Owned>(records: &[T], id: &str, who: &Authenticated) -> Verdict<usize> {
    match guard::authorize(records, id, &who.user_id) {
        Access::Allow(index) => Ok(index),
        Access::OwnerMismatch => Err(Rejection::OwnerMismatch),
        Access::NotFound => Err(Rejection::NotFound),
    }
}
