//! HTTP handlers for user sessions
//!
//! - GET    /users           — redirect to the memo list or the login form
//! - GET    /users/login     — login form
//! - GET    /users/register  — registration form
//! - POST   /users/login     — verify credentials, set the session cookie
//! - POST   /users/register  — create a user
//! - POST   /users/logout    — clear the session cookie

use crate::auth::credentials::CredentialStore;
use crate::auth::token::TokenService;
use crate::auth::types::CredentialsForm;
use crate::error::Error;
use crate::http::{self, FormView, Payload};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const USER_EXISTS: &str = "User already exists";
const MISSING_FIELDS: &str = "Username and password are required";

/// Shared state for user handlers
#[derive(Clone)]
pub struct UsersState {
    pub credentials: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
}

/// Create the users router
pub fn users_router(state: UsersState) -> Router {
    Router::new()
        .route("/users", get(users_index))
        .route("/users/login", get(login_form).post(login))
        .route("/users/register", get(register_form).post(register))
        .route("/users/logout", post(logout))
        .with_state(state)
}

fn login_view() -> FormView {
    FormView::new("login", "/users/login", &["username", "password"])
}

fn register_view() -> FormView {
    FormView::new("register", "/users/register", &["username", "password"])
}

/// GET /users
async fn users_index(headers: HeaderMap) -> Redirect {
    if http::session_token(&headers).is_some() {
        Redirect::to("/memos")
    } else {
        Redirect::to("/users/login")
    }
}

/// GET /users/login
async fn login_form() -> Json<FormView> {
    Json(login_view())
}

/// GET /users/register
async fn register_form() -> Json<FormView> {
    Json(register_view())
}

/// POST /users/login
async fn login(
    State(state): State<UsersState>,
    Payload(form): Payload<CredentialsForm>,
) -> Response {
    let user_id = match state
        .credentials
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(id) => id,
        Err(Error::InvalidCredentials) => {
            return Json(login_view().with_error(INVALID_CREDENTIALS)).into_response()
        }
        Err(e) => return http::fatal(e),
    };

    match state.tokens.issue(&user_id) {
        Ok(token) => (
            [(header::SET_COOKIE, http::session_cookie(&token))],
            Redirect::to("/memos"),
        )
            .into_response(),
        Err(e) => http::fatal(e),
    }
}

/// POST /users/register
async fn register(
    State(state): State<UsersState>,
    Payload(form): Payload<CredentialsForm>,
) -> Response {
    if form.username.is_empty() || form.password.is_empty() {
        return Json(register_view().with_error(MISSING_FIELDS)).into_response();
    }

    match state
        .credentials
        .register(&form.username, &form.password)
        .await
    {
        Ok(_) => Redirect::to("/users/login").into_response(),
        Err(Error::DuplicateUsername(_)) => {
            Json(register_view().with_error(USER_EXISTS)).into_response()
        }
        Err(e) => http::fatal(e),
    }
}

/// POST /users/logout
///
/// Only the client's copy of the token is removed; the token itself stays
/// valid until it expires.
async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, http::clear_session_cookie())],
        Redirect::to("/users/login"),
    )
}
