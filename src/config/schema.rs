//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::path::{join_url_path, DEFAULT_DOCUMENT};

/// Root configuration for the CMS router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CmsConfig {
    /// Published content and redirect settings.
    pub content: ContentConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Hosting application the router fronts.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

macro_rules! changed_fields {
    ($old:expr, $new:expr; $($section:ident . $field:ident),* $(,)?) => {{
        let mut changed = Vec::new();
        $(
            if $old.$section.$field != $new.$section.$field {
                changed.push(concat!(stringify!($section), ".", stringify!($field)));
            }
        )*
        changed
    }};
}

impl CmsConfig {
    /// Dotted names of the settings that differ between `self` and `other`.
    pub fn changed_fields(&self, other: &CmsConfig) -> Vec<&'static str> {
        changed_fields!(self, other;
            content.content_root,
            content.content_url,
            content.content_dir,
            content.default_document,
            content.redirect_listing_path,
            content.editor_allow_list,
            listener.bind_address,
            upstream.app_url,
            upstream.renderer_path,
            upstream.page_data_path,
            upstream.excluded_prefixes,
            timeouts.probe_secs,
            timeouts.request_secs,
            observability.log_level,
            observability.json_logs,
            observability.metrics_enabled,
            observability.metrics_address,
        )
    }
}

/// Published content settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Path to published CMS content, relative to the content origin. Required.
    pub content_root: String,

    /// Origin serving `content_root`. Defaults to the upstream application.
    pub content_url: Option<String>,

    /// Local directory holding the content export. Takes precedence over `content_url`.
    pub content_dir: Option<String>,

    /// Default directory document.
    pub default_document: String,

    /// Redirect listing JSON, relative to `content_root` unless it starts with `/`.
    /// Absent disables redirect matching.
    pub redirect_listing_path: Option<String>,

    /// Editor origins allowed to launch the CMS editor (`*` allows any).
    pub editor_allow_list: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            content_root: String::new(),
            content_url: None,
            content_dir: None,
            default_document: DEFAULT_DOCUMENT.to_string(),
            redirect_listing_path: None,
            editor_allow_list: Vec::new(),
        }
    }
}

impl ContentConfig {
    /// Resolved location of the redirect listing, if configured.
    pub fn redirect_listing_location(&self) -> Option<String> {
        let path = self.redirect_listing_path.as_deref().filter(|p| !p.is_empty())?;
        if path.starts_with('/') {
            Some(path.to_string())
        } else {
            Some(join_url_path(&self.content_root, path))
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Hosting application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Application origin receiving pass-through and rewritten requests (http only).
    pub app_url: String,

    /// Application path of the page rendering handler.
    pub renderer_path: String,

    /// Local path serving page records to the renderer.
    pub page_data_path: String,

    /// Paths under these prefixes bypass content and redirect routing.
    pub excluded_prefixes: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            app_url: "http://127.0.0.1:3000".to_string(),
            renderer_path: "/cms_support/page_object".to_string(),
            page_data_path: "/_cms/page".to_string(),
            excluded_prefixes: vec![
                "/api".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Content probe and listing fetch timeout in seconds.
    pub probe_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
