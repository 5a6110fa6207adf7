//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lookup_bad_requests_total` (counter): requests rejected by route lookup
//! - `lookup_requests_total` (counter): completed requests by status
//! - `lookup_request_duration_seconds` (histogram): latency distribution

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Sink for request-level error counters.
pub trait MetricsReporter: Send + Sync {
    /// Count one request rejected as a bad request.
    fn capture_bad_request(&self);
}

/// Reporter backed by the global `metrics` recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusReporter;

impl MetricsReporter for PrometheusReporter {
    fn capture_bad_request(&self) {
        ::metrics::counter!("lookup_bad_requests_total").increment(1);
    }
}

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(status: u16, start: Instant) {
    ::metrics::counter!("lookup_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("lookup_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
