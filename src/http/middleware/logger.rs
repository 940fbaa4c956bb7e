//! Request logging middleware.

use std::time::Instant;

use crate::http::context::Context;
use crate::observability::metrics;

/// Log status, URI and latency of every request passing through, and record
/// request metrics.
pub fn logger() -> impl Fn(&mut Context) + Send + Sync + 'static {
    |c: &mut Context| {
        let start = Instant::now();

        c.next();

        let status = c.status_code();
        tracing::info!(
            request_id = c.request().request_id().unwrap_or("-"),
            method = %c.method(),
            uri = %c.request().uri(),
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );
        metrics::record_request(c.method().as_str(), status.as_u16(), start);
    }
}
