//! Error types shared across the routing engine and its collaborators.

use thiserror::Error;

/// Errors raised while constructing the routing engine.
#[derive(Debug, Error)]
pub enum RouterError {
    /// `content_root` was empty or missing.
    #[error("CMS configuration error: content_root is required")]
    MissingContentRoot,

    /// The content store base URL could not be parsed.
    #[error("Invalid content URL '{url}': {source}")]
    InvalidContentUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client for the content store could not be built.
    #[error("Failed to build content client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Transport failure while probing a content location.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Content request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid content location '{0}'")]
    InvalidLocation(String),
}

/// Failure while loading a redirect listing.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Listing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Listing returned status {0}")]
    Status(u16),

    #[error("Listing read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Listing is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid listing location '{0}'")]
    InvalidLocation(String),
}

/// Editor origin that cannot be checked against the allow-list.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("Invalid editor origin '{origin}': {source}")]
    InvalidCandidate {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Editor origin '{0}' has no host")]
    MissingHost(String),
}

/// Failure while preparing the standalone page for the renderer.
#[derive(Debug, Error)]
pub enum PageError {
    /// No page path was given and the request did not come from an editor.
    #[error("Page not found")]
    NotFound,
}
