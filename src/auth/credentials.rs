//! Credential store — user registration and password verification
//!
//! Users live in their own collection (`users.json`). Passwords are stored as
//! Argon2id PHC strings; verification takes its parameters from the stored
//! hash, so changing the configured cost only affects new registrations.
//!
//! Login failures are uniform: an unknown username and a wrong password both
//! yield [`Error::InvalidCredentials`], and the unknown-username path still
//! verifies against a dummy hash so the two take comparable time.

use crate::auth::types::{User, UserId};
use crate::config::PasswordHashingConfig;
use crate::error::{Error, Result};
use crate::store::{Collection, Write};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

/// Persists users and verifies their passwords
pub struct CredentialStore {
    users: Collection<User>,
    hasher: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialStore {
    /// Create a credential store over an opened users collection
    pub fn new(users: Collection<User>, hashing: &PasswordHashingConfig) -> Result<Self> {
        let params = Params::new(
            hashing.memory_kib,
            hashing.iterations,
            hashing.parallelism,
            None,
        )
        .map_err(|e| Error::Config(format!("invalid password hashing parameters: {}", e)))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut filler = [0u8; 16];
        rand::RngCore::fill_bytes(&mut OsRng, &mut filler);
        let dummy_hash = hash_with(&hasher, &filler)?;

        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    /// Register a new user.
    ///
    /// Fails with `DuplicateUsername` on an exact, case-sensitive match; the
    /// existing record is left as it was.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId> {
        if self.find_by_username(username).await?.is_some() {
            return Err(Error::DuplicateUsername(username.to_string()));
        }

        let password_hash = self.hash_password(password).await?;
        let user = User {
            id: UserId::generate(),
            username: username.to_string(),
            password_hash,
        };

        // The pre-check above ran without the writer lock; check again inside it.
        let id = self
            .users
            .transact(move |users| {
                if users.iter().any(|u| u.username == user.username) {
                    return Err(Error::DuplicateUsername(user.username.clone()));
                }
                let id = user.id.clone();
                users.push(user);
                Ok(Write::Commit(id))
            })
            .await?;

        tracing::info!(user_id = %id, username, "Registered user");
        Ok(id)
    }

    /// Verify a username/password pair and return the user's id
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserId> {
        let user = self.find_by_username(username).await?;

        let (expected_hash, user_id) = match user {
            Some(u) => (u.password_hash, Some(u.id)),
            None => (self.dummy_hash.clone(), None),
        };

        let verified = self.verify_password(password, expected_hash).await?;
        match user_id {
            Some(id) if verified => {
                tracing::info!(user_id = %id, "User authenticated");
                Ok(id)
            }
            _ => {
                tracing::debug!("Rejected login attempt");
                Err(Error::InvalidCredentials)
            }
        }
    }

    /// Look up a user by id
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        self.users.find(id.as_str()).await
    }

    /// Number of registered users
    pub async fn count(&self) -> Result<usize> {
        self.users.len().await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .load_all()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_with(&hasher, password.as_bytes()))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
            Ok(parsed) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is unreadable: {}", e);
                false
            }
        })
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))
    }
}

fn hash_with(hasher: &Argon2<'static>, password: &[u8]) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher
        .hash_password(password, &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Crypto(format!("password hashing failed: {}", e)))
}
