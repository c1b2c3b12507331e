//! Session token service
//!
//! Tokens are compact JWS values (`header.claims.signature`, base64url without
//! padding) signed with HMAC-SHA256 over a process-wide secret. The claims carry
//! the user id; verification needs nothing but the secret, so there is no
//! server-side revocation: a token stays valid until it expires (when a TTL is
//! configured) or the secret is rotated. The user's continued existence is not
//! checked.

use crate::auth::types::UserId;
use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use ring::hmac;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Name of the HTTP-only cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

const ALGORITHM: &str = "HS256";

/// Raw signing secret, wiped from memory on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Random secret for processes started without a configured one.
    ///
    /// Tokens signed with it do not survive a restart.
    pub fn ephemeral() -> Self {
        let mut bytes = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(***)")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Identity payload embedded in a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: UserId,
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies signed session tokens
pub struct TokenService {
    key: hmac::Key,
    ttl: Option<Duration>,
}

impl TokenService {
    /// `ttl` of `None` issues tokens that never expire
    pub fn new(secret: &SigningSecret, ttl: Option<Duration>) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, &secret.0),
            ttl,
        }
    }

    /// Issue a token for `user_id`
    pub fn issue(&self, user_id: &UserId) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<String> {
        let exp = match self.ttl {
            Some(ttl) => Some(
                now.checked_add_signed(ttl)
                    .ok_or_else(|| Error::Internal("token expiry out of range".into()))?
                    .timestamp(),
            ),
            None => None,
        };
        let claims = SessionClaims {
            user_id: user_id.clone(),
            iat: now.timestamp(),
            exp,
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(tag.as_ref())))
    }

    /// Verify a presented token and return the user it names
    pub fn verify(&self, token: Option<&str>) -> Result<UserId> {
        self.verify_at(token, Utc::now()).map(|claims| claims.user_id)
    }

    /// Verify a presented token as if the current time were `now`
    pub fn verify_at(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<SessionClaims> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(Error::MissingToken),
        };

        let mut parts = token.split('.');
        let (header_b64, claims_b64, sig_b64) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(c), Some(s), None) => (h, c, s),
            _ => return Err(Error::InvalidToken("malformed token".into())),
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(Error::InvalidToken(format!("unsupported algorithm {}", header.alg)));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| Error::InvalidToken("malformed signature".into()))?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        hmac::verify(&self.key, signing_input.as_bytes(), &signature)
            .map_err(|_| Error::InvalidToken("invalid signature".into()))?;

        let claims: SessionClaims = decode_segment(claims_b64)?;
        if let Some(exp) = claims.exp {
            if now.timestamp() >= exp {
                return Err(Error::InvalidToken("token expired".into()));
            }
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::InvalidToken("malformed encoding".into()))?;
    serde_json::from_slice(&bytes).map_err(|_| Error::InvalidToken("malformed payload".into()))
}
