//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dev_proxy_requests_total` (counter): forwarded requests by rule, status
//! - `dev_proxy_request_duration_seconds` (histogram): latency by rule
//!
//! Without an installed recorder the macros are no-ops, so the handler
//! records unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "dev_proxy_requests_total";
pub const REQUEST_DURATION: &str = "dev_proxy_request_duration_seconds";

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one forwarded request.
pub fn record_request(rule: &str, status: u16, start: Instant) {
    let rule = rule.to_string();
    metrics::counter!(REQUESTS_TOTAL, "rule" => rule.clone(), "status" => status.to_string())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION, "rule" => rule).record(start.elapsed().as_secs_f64());
}
