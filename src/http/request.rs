//! Request identification helpers.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (SetRequestIdLayer)
//! - The same ID is echoed back to the client and forwarded upstream

use axum::http::HeaderMap;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID of a request, or `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
