//! Memopad configuration management
//!
//! Resolution order: built-in defaults, then an optional TOML file, then the
//! process environment (`PORT` and the signing-secret variable named by
//! `auth.secret_env`, `JWT_SECRET` by default).

use crate::auth::token::SigningSecret;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted session token lifetime (100 years)
pub const MAX_TOKEN_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Main Memopad configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemopadConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Collection storage configuration
    pub storage: StorageConfig,

    /// Session and password configuration
    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Collection storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the collection files
    pub data_dir: PathBuf,

    /// Users collection file name
    pub users_file: String,

    /// Memos collection file name
    pub memos_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("memopad");

        Self {
            data_dir: base.join("data"),
            users_file: "users.json".to_string(),
            memos_file: "memos.json".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn memos_path(&self) -> PathBuf {
        self.data_dir.join(&self.memos_file)
    }
}

/// Session and password configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Environment variable holding the token signing secret
    pub secret_env: String,

    /// Signing secret resolved at startup; never written back out
    #[serde(skip_serializing)]
    pub secret: Option<String>,

    /// Token lifetime in seconds. Unset means tokens never expire.
    pub token_ttl_secs: Option<u64>,

    /// Argon2 cost parameters for new password hashes
    pub hashing: PasswordHashingConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_env: "JWT_SECRET".to_string(),
            secret: None,
            token_ttl_secs: None,
            hashing: PasswordHashingConfig::default(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordHashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl MemopadConfig {
    /// Load from a TOML file, or defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` as the environment
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(secret) = lookup(&self.auth.secret_env) {
            self.auth.secret = Some(secret);
        }
        Ok(())
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.storage.users_file.is_empty() || self.storage.memos_file.is_empty() {
            return Err(Error::Config("collection file names must not be empty".into()));
        }
        if self.storage.users_path() == self.storage.memos_path() {
            return Err(Error::Config(
                "users and memos must be stored in different files".into(),
            ));
        }
        if matches!(self.auth.secret.as_deref(), Some("")) {
            return Err(Error::Config(format!("{} is set but empty", self.auth.secret_env)));
        }
        match self.auth.token_ttl_secs {
            Some(0) => return Err(Error::Config("token_ttl_secs must be positive".into())),
            Some(secs) if secs > MAX_TOKEN_TTL_SECS => {
                return Err(Error::Config(format!(
                    "token_ttl_secs must be at most {} (100 years), got {}",
                    MAX_TOKEN_TTL_SECS, secs
                )))
            }
            _ => {}
        }
        Ok(())
    }

    /// The token signing secret.
    ///
    /// Falls back to a random per-process secret, in which case every issued
    /// token becomes unverifiable after a restart.
    pub fn signing_secret(&self) -> SigningSecret {
        match &self.auth.secret {
            Some(secret) => SigningSecret::new(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "{} not set; using an ephemeral signing secret, sessions will not survive a restart",
                    self.auth.secret_env
                );
                SigningSecret::ephemeral()
            }
        }
    }

    pub fn token_ttl(&self) -> Option<chrono::Duration> {
        self.auth
            .token_ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(chrono::Duration::try_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = MemopadConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.secret_env, "JWT_SECRET");
        assert!(config.auth.token_ttl_secs.is_none());
        assert!(config.storage.users_path().ends_with("users.json"));
        assert!(config.storage.memos_path().ends_with("memos.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = MemopadConfig::from_toml(
            r#"
            [server]
            port = 8080

            [storage]
            data_dir = "/tmp/memopad"

            [auth]
            token_ttl_secs = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.memos_path(), PathBuf::from("/tmp/memopad/memos.json"));
        assert_eq!(config.token_ttl(), Some(chrono::Duration::seconds(3600)));
    }

    #[test]
    fn test_invalid_toml() {
        let err = MemopadConfig::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = MemopadConfig::default();
        config
            .apply_env_from(env(&[("PORT", "4000"), ("JWT_SECRET", "s3cret")]))
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_custom_secret_env() {
        let mut config = MemopadConfig::default();
        config.auth.secret_env = "MEMOPAD_SECRET".to_string();
        config
            .apply_env_from(env(&[("JWT_SECRET", "ignored"), ("MEMOPAD_SECRET", "used")]))
            .unwrap();
        assert_eq!(config.auth.secret.as_deref(), Some("used"));
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut config = MemopadConfig::default();
        let err = config.apply_env_from(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_shared_file() {
        let mut config = MemopadConfig::default();
        config.storage.memos_file = "users.json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_token_ttl() {
        let mut config = MemopadConfig::default();

        config.auth.token_ttl_secs = Some(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.auth.token_ttl_secs = Some(10_000_000_000_000);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.auth.token_ttl_secs = Some(i64::MAX as u64);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(config.token_ttl().is_none());

        config.auth.token_ttl_secs = Some(MAX_TOKEN_TTL_SECS);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.token_ttl(),
            Some(chrono::Duration::seconds(MAX_TOKEN_TTL_SECS as i64))
        );
    }

    #[test]
    fn test_secret_not_serialized() {
        let mut config = MemopadConfig::default();
        config.auth.secret = Some("hidden".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("hidden"));
    }
}
