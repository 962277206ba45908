//! Translation of routing decisions into HTTP terms.
//!
//! # Responsibilities
//! - Resolve redirect destinations against the request URL
//! - Build 301/302 responses with a `Location` header
//! - Build the renderer rewrite target for published content
//!
//! # Design Decisions
//! - Absolute destinations are used unchanged
//! - Scheme comes from `X-Forwarded-Proto` when present, otherwise http

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters escaped in a query component value.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Absolute URL of the incoming request, if its Host header is usable.
pub fn request_base_url(headers: &HeaderMap, uri: &Uri) -> Option<Url> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))?;
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| *v == "http" || *v == "https")
        .unwrap_or("http");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    Url::parse(&format!("{}://{}{}", scheme, host, path)).ok()
}

/// Resolve a redirect destination the way a browser resolves a link.
pub fn resolve_destination(destination: &str, base: Option<&Url>) -> String {
    if let Ok(url) = Url::parse(destination) {
        return url.to_string();
    }
    base.and_then(|b| b.join(destination).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| destination.to_string())
}

/// Redirect response carrying `location`, `None` if it is not a valid header value.
pub fn redirect_response(status: StatusCode, location: &str) -> Option<Response> {
    match Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
    {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(location = %location, error = %e, "Redirect destination is not a valid header value");
            None
        }
    }
}

/// Renderer target for published content at `original_path`.
///
/// The original query string is carried along so editor parameters reach the renderer.
pub fn renderer_target(renderer_path: &str, original_path: &str, original_query: Option<&str>) -> String {
    let mut target = format!(
        "{}?url={}",
        renderer_path,
        utf8_percent_encode(original_path, COMPONENT)
    );
    if let Some(query) = original_query.filter(|q| !q.is_empty()) {
        target.push('&');
        target.push_str(query);
    }
    target
}
