//! Unified API router for Memopad
//!
//! Opens the collections, wires the services together, and merges the module
//! routers into a single axum `Router`.
//!
//! ## Endpoint Map
//!
//! | Prefix     | Module | Description                              |
//! |------------|--------|------------------------------------------|
//! | `/`        | api    | Redirect to the memo list                |
//! | `/health`  | api    | Liveness probe                           |
//! | `/users/*` | auth   | Login, registration, logout              |
//! | `/memos/*` | memos  | List, search, create, edit, delete       |

use crate::auth::{users_router, CredentialStore, TokenService, UsersState};
use crate::config::MemopadConfig;
use crate::error::Result;
use crate::http::ApiError;
use crate::memos::{memos_router, MemoService, MemosState};
use crate::store::Collection;
use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Combined application state holding references to all services
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub memos: Arc<MemoService>,
}

impl AppState {
    /// Open both collections and build the services from `config`.
    ///
    /// Missing collection files are created empty.
    pub async fn from_config(config: &MemopadConfig) -> Result<Self> {
        let users = Collection::open_file("users", config.storage.users_path()).await?;
        let memos = Collection::open_file("memos", config.storage.memos_path()).await?;
        tracing::info!(
            users = %users.location(),
            memos = %memos.location(),
            "Collections ready"
        );

        let tokens = Arc::new(TokenService::new(
            &config.signing_secret(),
            config.token_ttl(),
        ));
        let credentials = Arc::new(CredentialStore::new(users, &config.auth.hashing)?);
        let memos = Arc::new(MemoService::new(memos, tokens.clone()));

        Ok(Self {
            credentials,
            tokens,
            memos,
        })
    }
}

/// Build the complete Memopad HTTP application
pub fn build_app(state: AppState) -> Router {
    let users = UsersState {
        credentials: state.credentials.clone(),
        tokens: state.tokens.clone(),
    };
    let memos = MemosState {
        service: state.memos.clone(),
    };

    Router::new()
        .route("/", get(|| async { Redirect::to("/memos") }))
        .route("/health", get(health_check))
        .merge(users_router(users))
        .merge(memos_router(memos))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found(uri: Uri) -> Response {
    ApiError::not_found(format!("No route for {}", uri.path()))
        .into_response_with(StatusCode::NOT_FOUND)
}
