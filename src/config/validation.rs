//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject a missing content root before any request is routed
//! - Validate URLs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CmsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::CmsConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("content.content_root is required")]
    MissingContentRoot,

    #[error("content.default_document must not be empty")]
    EmptyDefaultDocument,

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("upstream.app_url must use http, got '{0}'")]
    UnsupportedUpstreamScheme(String),

    #[error("{field} must start with '/': {value}")]
    RelativePath { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

pub fn validate_config(config: &CmsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.content.content_root.trim().is_empty() {
        errors.push(ValidationError::MissingContentRoot);
    }
    if config.content.default_document.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultDocument);
    }
    if let Some(content_url) = &config.content.content_url {
        if Url::parse(content_url).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: "content.content_url",
                value: content_url.clone(),
            });
        }
    }

    match Url::parse(&config.upstream.app_url) {
        Ok(url) if url.scheme() != "http" => {
            errors.push(ValidationError::UnsupportedUpstreamScheme(url.scheme().to_string()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidUrl {
            field: "upstream.app_url",
            value: config.upstream.app_url.clone(),
        }),
    }
    for (field, value) in [
        ("upstream.renderer_path", &config.upstream.renderer_path),
        ("upstream.page_data_path", &config.upstream.page_data_path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.probe_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.probe_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
