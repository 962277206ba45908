//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cms_router_decisions_total` (counter): routing decisions by kind
//! - `cms_router_decision_duration_seconds` (histogram): time to decide
//! - `cms_router_probe_errors_total` (counter): content probe transport failures
//! - `cms_router_listing_errors_total` (counter): redirect listing load failures
//! - `cms_router_rule_compile_errors_total` (counter): rules disabled by a bad pattern
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_decision(kind: &'static str, start: Instant) {
    counter!("cms_router_decisions_total", "decision" => kind).increment(1);
    histogram!("cms_router_decision_duration_seconds", "decision" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_probe_error() {
    counter!("cms_router_probe_errors_total").increment(1);
}

pub fn record_listing_error() {
    counter!("cms_router_listing_errors_total").increment(1);
}

pub fn record_rule_compile_error() {
    counter!("cms_router_rule_compile_errors_total").increment(1);
}
