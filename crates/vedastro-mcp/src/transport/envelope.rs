//! HTTP-level failure shapes shared by both transports.
//!
//! The streaming path answers with a JSON-RPC error envelope and `id: null`;
//! the session path answers with `{error: message}`. Clients depend on both
//! shapes staying as they are.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::types::{error_codes, JSONRPC_VERSION};

/// Plain-text response, used for addressing and method errors.
pub fn plain(status: StatusCode, text: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text.into(),
    )
        .into_response()
}

pub fn method_not_allowed(text: impl Into<String>) -> Response {
    plain(StatusCode::METHOD_NOT_ALLOWED, text)
}

/// JSON-RPC error envelope that precedes correlation (`id: null`).
pub fn jsonrpc_failure(status: StatusCode, code: i32, message: &str) -> Response {
    (
        status,
        Json(json!({
            "jsonrpc": JSONRPC_VERSION,
            "error": { "code": code, "message": message },
            "id": null
        })),
    )
        .into_response()
}

/// Streaming transport catch-all: HTTP 500, internal error code.
pub fn internal_failure(message: &str) -> Response {
    jsonrpc_failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        non_empty(message),
    )
}

/// Session transport catch-all: HTTP 500 with `{error}`.
pub fn session_failure(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": non_empty(message) })),
    )
        .into_response()
}

fn non_empty(message: &str) -> &str {
    if message.trim().is_empty() {
        "Internal server error"
    } else {
        message
    }
}
