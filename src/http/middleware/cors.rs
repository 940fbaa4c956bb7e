//! CORS header stamping.

use axum::http::{Method, StatusCode};

use crate::config::CorsConfig;
use crate::http::context::Context;

/// Stamp the configured CORS headers on every response.
///
/// Preflight (`OPTIONS`) requests are answered with 204 and the chain is aborted,
/// so no route handler runs for them.
pub fn cors(config: CorsConfig) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |c: &mut Context| {
        c.set_header("access-control-allow-origin", &config.allow_origin);
        if config.allow_credentials {
            c.set_header("access-control-allow-credentials", "true");
        }
        c.set_header("access-control-allow-headers", &config.allow_headers.join(", "));
        c.set_header("access-control-allow-methods", &config.allow_methods.join(", "));

        if c.method() == Method::OPTIONS {
            tracing::debug!(path = c.path(), "Answering CORS preflight");
            c.status(StatusCode::NO_CONTENT);
            c.abort();
            return;
        }

        c.next();
    }
}
