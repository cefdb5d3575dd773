//! Pre-shared key guard for the check-in desk API.
//!
//! Keys are compared in constant time.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests without the configured key.
/// With no key configured every request passes.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_psk.as_deref() else {
        return next.run(request).await;
    };

    let verdict = provided_key(request.headers()).map(|key| keys_match(key, expected));
    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => unauthorized("Invalid API key", &state).await,
        None => unauthorized("Missing API key", &state).await,
    }
}

/// The key from `x-api-key`, or else from an `Authorization: Bearer` header.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

async fn unauthorized(message: &str, state: &AppState) -> Response {
    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: state.store.revision().await,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("desk-key-123", "desk-key-123"));
        assert!(!keys_match("desk-key-123", "desk-key-124"));
        assert!(!keys_match("short", "much-longer-key"));
        assert!(!keys_match("", "not-empty"));
    }

    #[test]
    fn test_provided_key_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(provided_key(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(provided_key(&headers), Some("from-bearer"));

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(provided_key(&headers), Some("from-header"));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(provided_key(&basic), None);
    }
}
