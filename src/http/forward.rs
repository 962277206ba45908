//! Forwarding to the hosting application.
//!
//! # Responsibilities
//! - Rewrite the request URI to an upstream target (pass-through, renderer, PASSTHRU rule)
//! - Send it with the shared hyper client and stream the response back
//!
//! # Design Decisions
//! - The client sees no redirect; rewrites are internal
//! - Original Host is kept in `X-Forwarded-Host`
//! - Only http targets are forwarded; callers fall back to the original path
//! - Upstream failures map to 502, never panic

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::http::request::request_id;

const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Sends rewritten requests to the hosting application.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    app: Url,
}

impl Forwarder {
    pub fn new(app: Url) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, app }
    }

    /// Upstream URI for `target`: absolute http URLs are kept, anything else
    /// is a path and query on the application origin.
    pub fn target_uri(&self, target: &str) -> Option<Uri> {
        let url = match Url::parse(target) {
            Ok(url) => url,
            Err(_) => self.on_app(target),
        };
        if url.scheme() != "http" {
            tracing::warn!(target = %url, "Only http upstream targets can be forwarded");
            return None;
        }
        url.as_str().parse().ok()
    }

    /// `//host/...` stays a path here, never a network-path reference.
    fn on_app(&self, target: &str) -> Url {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let mut url = self.app.clone();
        url.set_path(path);
        url.set_query(query);
        url
    }

    /// Forward `request` to `uri` and return the upstream response.
    pub async fn forward(&self, mut request: Request<Body>, uri: Uri) -> Response {
        let request_id = request_id(request.headers()).to_string();

        if let Some(original_host) = request.headers().get(header::HOST).cloned() {
            request.headers_mut().insert(X_FORWARDED_HOST, original_host);
        }
        if let Some(authority) = uri.authority() {
            if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                request.headers_mut().insert(header::HOST, value);
            }
        }
        *request.uri_mut() = uri;

        tracing::debug!(request_id = %request_id, upstream = %request.uri(), "Forwarding request");

        match self.client.request(request).await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}
