//! Authentication and ownership
//!
//! - [`credentials`]: user registration and password verification
//! - [`token`]: signed session tokens
//! - [`guard`]: record ownership checks
//! - [`handler`]: `/users` HTTP routes (login, register, logout)

pub mod credentials;
pub mod guard;
pub mod handler;
pub mod token;
pub mod types;

pub use credentials::CredentialStore;
pub use guard::{authorize, Access, Owned};
pub use handler::{users_router, UsersState};
pub use token::{SessionClaims, SigningSecret, TokenService, SESSION_COOKIE};
pub use types::{User, UserId};
