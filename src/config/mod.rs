//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CMS_* environment
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → CmsConfig (validated, immutable)
//!     → Engine::from_config (compiled routing engine)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new Engine built and swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults except the content root
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{CmsConfig, ContentConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig, UpstreamConfig};
