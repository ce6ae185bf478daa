// src/logging_middleware.rs
//! Middleware for logging request and response bodies at debug level
//! Enabled with `LOG_HTTP_BODIES=true`; chat text is shortened before it is logged

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

use crate::common::helpers::truncate_with_ellipsis;

/// Largest request body buffered for logging; bigger ones pass through unlogged
const MAX_LOGGED_BODY_BYTES: usize = 1024 * 1024;

/// Longest chat text shown in a logged body
const MAX_LOGGED_TEXT_CHARS: usize = 120;

/// Fields carrying user prompts or model replies
const CHAT_TEXT_FIELDS: [&str; 2] = ["message", "response"];

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let request = if fits_log_buffer(request.headers()) {
        let (parts, body) = request.into_parts();

        let bytes = to_bytes(body, MAX_LOGGED_BODY_BYTES)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        if let Some(logged) = render_body(&bytes) {
            debug!(
                method = %parts.method,
                uri = %parts.uri,
                request_body = %logged,
                "📥 Request"
            );
        }

        Request::from_parts(parts, Body::from(bytes))
    } else {
        // Body size limits stay with the handlers' extractors
        debug!(
            method = %request.method(),
            uri = %request.uri(),
            "📥 Request (body not logged: missing or large Content-Length)"
        );
        request
    };

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(logged) = render_body(&bytes) {
        debug!(
            status = %parts.status,
            response_body = %logged,
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

/// Only bodies with a declared length under the cap are buffered for logging
fn fits_log_buffer(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .map_or(false, |len| len <= MAX_LOGGED_BODY_BYTES)
}

/// Log-ready body text, or `None` for empty or non-UTF-8 bodies
fn render_body(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let body_str = std::str::from_utf8(bytes).ok()?;

    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            shorten_chat_text(&mut json);
            Some(serde_json::to_string(&json).unwrap_or_else(|_| body_str.to_string()))
        }
        Err(_) => Some(body_str.to_string()),
    }
}

fn shorten_chat_text(json: &mut Value) {
    if let Value::Object(map) = json {
        for field in CHAT_TEXT_FIELDS {
            if let Some(Value::String(text)) = map.get_mut(field) {
                *text = truncate_with_ellipsis(text, MAX_LOGGED_TEXT_CHARS);
            }
        }
    }
}
