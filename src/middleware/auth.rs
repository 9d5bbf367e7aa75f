use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::server::router::AppState;

fn key_matches(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Ensure the inbound request carries the admin key.
/// Accepts either:
/// - Header: `Authorization: Bearer ...`
/// - Header: `x-admin-key: ...`
/// - Query string: `?key=...`
///
/// An empty configured key rejects everything.
pub fn ensure_authorized(
    expected: &str,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Result<(), Response> {
    if !expected.is_empty() {
        if let Some(hv) = headers.get("x-admin-key").and_then(|v| v.to_str().ok())
            && key_matches(hv, expected)
        {
            return Ok(());
        }

        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            let auth = auth.trim();
            if let Some(token) = auth
                .strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
                && key_matches(token, expected)
            {
                return Ok(());
            }
        }

        if let Some(qs) = query {
            for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
                if k == "key" && key_matches(&v, expected) {
                    return Ok(());
                }
            }
        }
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"code": "UNAUTHORIZED", "message": "invalid or missing key"}})),
    )
        .into_response())
}

#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        ensure_authorized(&state.admin_key, &parts.headers, parts.uri.query())?;
        Ok(Self)
    }
}
