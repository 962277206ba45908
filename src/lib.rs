//! CMS content router library.
//!
//! Decides, for every incoming request, whether published CMS content exists
//! (rewrite to the renderer), whether a redirect rule applies, or whether the
//! request passes through to the hosting application untouched.

pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::CmsConfig;
pub use engine::Engine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RequestRouter, RoutingDecision};
