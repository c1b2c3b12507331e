//! Memopad error types

use thiserror::Error;

/// Memopad error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backing collection could not be read, parsed or written
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A record with the same id is already present in the collection
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// Registration attempted with a username that is already taken
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// Unknown username or wrong password; the two are not distinguished
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No session token was presented
    #[error("Missing session token")]
    MissingToken,

    /// Session token is malformed, expired, or its signature does not validate
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    /// Cryptographic error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the token failures that the request pipeline reports as
    /// "unauthenticated" rather than as a fatal error.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::MissingToken | Error::InvalidToken(_))
    }
}

/// Result type alias for Memopad operations
pub type Result<T> = std::result::Result<T, Error>;
