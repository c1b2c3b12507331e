//! Shared HTTP plumbing for the module routers
//!
//! Session cookie handling, the form-or-JSON body extractor, the JSON error
//! envelope, and the mapping from pipeline rejections to responses.

use crate::auth::token::SESSION_COOKIE;
use crate::error::Error;
use crate::memos::Memo;
use crate::pipeline::{Rejection, RequestContext};
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{de::DeserializeOwned, Serialize};

/// Where an ownership mismatch sends the browser
pub const AUTH_ERROR_REDIRECT: &str = "/memos?authError=true";

// =============================================================================
// Error envelope
// =============================================================================

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// A failed request that is not a rejection: storage or other fatal errors
pub fn fatal(err: Error) -> Response {
    tracing::error!("Request failed: {}", err);
    ApiError::internal(err.to_string()).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Map a pipeline rejection to its response
pub fn rejection(rejection: Rejection) -> Response {
    match rejection {
        Rejection::Unauthenticated(reason) => {
            ApiError::unauthorized(reason).into_response_with(StatusCode::FORBIDDEN)
        }
        Rejection::NotFound => {
            ApiError::not_found("Memo not found").into_response_with(StatusCode::NOT_FOUND)
        }
        Rejection::OwnerMismatch => Redirect::to(AUTH_ERROR_REDIRECT).into_response(),
    }
}

// =============================================================================
// Form views
// =============================================================================

/// Stand-in for a rendered form: what to submit and where
#[derive(Debug, Serialize)]
pub struct FormView {
    pub form: &'static str,
    pub action: String,
    pub fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<Memo>,
}

impl FormView {
    pub fn new(form: &'static str, action: impl Into<String>, fields: &[&'static str]) -> Self {
        Self {
            form,
            action: action.into(),
            fields: fields.to_vec(),
            error: None,
            memo: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_memo(mut self, memo: Memo) -> Self {
        self.memo = Some(memo);
        self
    }
}

// =============================================================================
// Session cookie
// =============================================================================

/// Session token from the `token` cookie, falling back to a bearer header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
        .next();

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, t)| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Request context built from the request headers
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    match session_token(headers) {
        Some(token) => RequestContext::with_token(token),
        None => RequestContext::anonymous(),
    }
}

/// `Set-Cookie` value storing a session token
pub fn session_cookie(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax",
        SESSION_COOKIE, token
    ))
    .unwrap_or_else(|_| clear_session_cookie())
}

/// `Set-Cookie` value removing the session token
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

// =============================================================================
// Body extractor
// =============================================================================

/// Request body accepted either as `application/json` or as an HTML form
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_session_token_from_cookie() {
        let h = headers(&[(header::COOKIE, "theme=dark; token=abc.def.ghi; other=1")]);
        assert_eq!(session_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_session_token_from_bearer() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(session_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        for value in ["bearer abc.def.ghi", "BEARER abc.def.ghi"] {
            let h = headers(&[(header::AUTHORIZATION, value)]);
            assert_eq!(session_token(&h).as_deref(), Some("abc.def.ghi"));
        }
        let h = headers(&[(header::AUTHORIZATION, "Basic abc.def.ghi")]);
        assert!(session_token(&h).is_none());
    }

    #[derive(Debug, serde::Deserialize)]
    struct Named {
        name: String,
    }

    async fn extract(content_type: &str, body: &'static str) -> Result<Named, Response> {
        let req = axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(axum::body::Body::from(body))
            .unwrap();
        Payload::<Named>::from_request(req, &()).await.map(|Payload(p)| p)
    }

    #[tokio::test]
    async fn test_payload_content_type_is_case_insensitive() {
        for ct in [
            "application/json",
            "Application/JSON",
            "application/json; charset=utf-8",
        ] {
            let parsed = extract(ct, r#"{"name":"memo"}"#).await.unwrap();
            assert_eq!(parsed.name, "memo");
        }
        let parsed = extract("application/x-www-form-urlencoded", "name=memo")
            .await
            .unwrap();
        assert_eq!(parsed.name, "memo");
    }

    #[test]
    fn test_cookie_preferred_over_bearer() {
        let h = headers(&[
            (header::COOKIE, "token=from-cookie"),
            (header::AUTHORIZATION, "Bearer from-header"),
        ]);
        assert_eq!(session_token(&h).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_no_token() {
        let h = headers(&[(header::COOKIE, "tokenish=1; token=")]);
        assert!(session_token(&h).is_none());
        assert!(request_context(&HeaderMap::new()).token().is_none());
    }

    #[test]
    fn test_cookie_values() {
        let set = session_cookie("abc");
        let set = set.to_str().unwrap();
        assert!(set.starts_with("token=abc;"));
        assert!(set.contains("HttpOnly"));
        assert!(clear_session_cookie().to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            rejection(Rejection::Unauthenticated("x".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(rejection(Rejection::NotFound).status(), StatusCode::NOT_FOUND);

        let redirect = rejection(Rejection::OwnerMismatch);
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get(header::LOCATION).unwrap(),
            AUTH_ERROR_REDIRECT
        );
    }
}
