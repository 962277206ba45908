//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing engine and HTTP front end produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (decision counters, latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request (TraceLayer span)
//! - Metrics are cheap and safe to record without an installed recorder

pub mod logging;
pub mod metrics;
