//! HTTP handlers for memos
//!
//! - GET    /memos              — list, `?search=` filters title/content
//! - GET    /memos/add          — creation form
//! - POST   /memos/add          — create a memo owned by the caller
//! - GET    /memos/edit/:id     — edit form (owner only)
//! - POST   /memos/edit/:id     — apply an edit (owner only)
//! - POST   /memos/delete/:id   — delete (owner only)
//!
//! Ownership mismatches redirect to `/memos?authError=true`; missing memos
//! are reported as not found.

use crate::http::{self, FormView, Payload};
use crate::memos::service::MemoService;
use crate::memos::types::{ListQuery, MemoDraft, MemoList};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for memo handlers
#[derive(Clone)]
pub struct MemosState {
    pub service: Arc<MemoService>,
}

/// Create the memos router
pub fn memos_router(state: MemosState) -> Router {
    Router::new()
        .route("/memos", get(list_memos))
        .route("/memos/add", get(add_form).post(add_memo))
        .route("/memos/edit/:id", get(edit_form).post(edit_memo))
        .route("/memos/delete/:id", post(delete_memo))
        .with_state(state)
}

/// GET /memos
async fn list_memos(State(state): State<MemosState>, Query(query): Query<ListQuery>) -> Response {
    match state.service.list(query.search.as_deref()).await {
        Ok(memos) => Json(MemoList {
            memos,
            auth_error: query.has_auth_error(),
        })
        .into_response(),
        Err(e) => http::fatal(e),
    }
}

/// GET /memos/add
async fn add_form() -> Json<FormView> {
    Json(FormView::new("memo", "/memos/add", &["title", "content"]))
}

/// POST /memos/add
async fn add_memo(
    State(state): State<MemosState>,
    headers: HeaderMap,
    Payload(draft): Payload<MemoDraft>,
) -> Response {
    let ctx = http::request_context(&headers);
    match state.service.create(&ctx, draft).await {
        Ok(Ok(_)) => Redirect::to("/memos").into_response(),
        Ok(Err(rejection)) => http::rejection(rejection),
        Err(e) => http::fatal(e),
    }
}

/// GET /memos/edit/:id
async fn edit_form(
    State(state): State<MemosState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = http::request_context(&headers);
    match state.service.edit_form(&ctx, &id).await {
        Ok(Ok(memo)) => {
            let action = format!("/memos/edit/{}", memo.id);
            Json(FormView::new("memo", action, &["title", "content"]).with_memo(memo))
                .into_response()
        }
        Ok(Err(rejection)) => http::rejection(rejection),
        Err(e) => http::fatal(e),
    }
}

/// POST /memos/edit/:id
async fn edit_memo(
    State(state): State<MemosState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Payload(draft): Payload<MemoDraft>,
) -> Response {
    let ctx = http::request_context(&headers);
    match state.service.edit(&ctx, &id, draft).await {
        Ok(Ok(_)) => Redirect::to("/memos").into_response(),
        Ok(Err(rejection)) => http::rejection(rejection),
        Err(e) => http::fatal(e),
    }
}

/// POST /memos/delete/:id
async fn delete_memo(
    State(state): State<MemosState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let ctx = http::request_context(&headers);
    match state.service.delete(&ctx, &id).await {
        Ok(Ok(_)) => Redirect::to("/memos").into_response(),
        Ok(Err(rejection)) => http::rejection(rejection),
        Err(e) => http::fatal(e),
    }
}
