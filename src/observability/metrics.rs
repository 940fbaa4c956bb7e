//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trellis_requests_total` (counter): requests by method, status
//! - `trellis_request_duration_seconds` (histogram): latency distribution by method
//!
//! # Design Decisions
//! - Recorded by the logger middleware, so only chains using it are counted
//! - Without an installed exporter the macros are no-ops

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::ServerError;

/// Start the Prometheus exporter on `addr`. Must be called within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), ServerError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ServerError::Metrics(e.to_string()))?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "trellis_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "trellis_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
