//! Buffered response.
//!
//! # Responsibilities
//! - Collect status, headers and body written by handlers
//! - Convert the result into an axum response once the chain finishes
//!
//! # Design Decisions
//! - The first status written wins on the wire; later writes are ignored with a
//!   warning but still reported by `last_status`
//! - Headers are frozen once the status has been written
//! - Writing body bytes before any status commits 200 OK

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;

#[derive(Debug, Default)]
pub struct Response {
    status: Option<StatusCode>,
    /// Most recent status any writer asked for.
    requested: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit the status line. Returns false if a status was already written.
    pub fn write_status(&mut self, code: StatusCode) -> bool {
        self.requested = Some(code);
        if let Some(current) = self.status {
            tracing::warn!(
                current = current.as_u16(),
                ignored = code.as_u16(),
                "Superfluous status write"
            );
            return false;
        }
        self.status = Some(code);
        true
    }

    /// Whether the status, and with it the headers, has been written.
    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    /// Set a header, replacing any previous value. Ignored once committed.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        if self.is_committed() {
            tracing::debug!(header = %name, "Header set after status was written, ignored");
            return;
        }
        self.headers.insert(name, value);
    }

    /// Append to the body, committing 200 OK if no status was written yet.
    pub fn write(&mut self, data: &[u8]) {
        if !self.is_committed() {
            self.status = Some(StatusCode::OK);
            self.requested.get_or_insert(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    /// Status that will be sent.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Last status requested by a writer, whether or not it reached the wire.
    pub fn last_status(&self) -> StatusCode {
        self.requested.unwrap_or_else(|| self.status())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}
