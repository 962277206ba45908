//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build engine → Start listener
//!
//! Shutdown:
//!     signals.rs (SIGTERM/SIGINT) → shutdown.rs broadcast
//!     → server stops accepting, drains in-flight requests
//!     → config reload task exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
