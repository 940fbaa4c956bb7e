//! Request snapshot and request IDs.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Capture method, URI, headers and the buffered body before the chain runs
//! - Expose query and form values to handlers
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body is fully buffered (size-limited by the server) so handlers stay synchronous
//! - The snapshot is immutable; handlers only write to the response

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values from random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Immutable view of an incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    /// Percent-decoded `uri.path()`, used for routing.
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// A request with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            path: decode_path(&uri),
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Build from the head of an HTTP request and its buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: decode_path(&parts.uri),
            uri: parts.uri,
            headers: parts.headers,
            body,
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Decoded request path. Use `uri()` for the raw form.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// First value of `key` in the query string.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// First value of `key` in a url-encoded form body, falling back to the query string.
    ///
    /// The body is only consulted for POST, PUT and PATCH requests.
    pub fn form_value(&self, key: &str) -> Option<String> {
        if self.has_form_body() {
            let value = url::form_urlencoded::parse(&self.body)
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned());
            if value.is_some() {
                return value;
            }
        }
        self.query(key)
    }

    fn has_form_body(&self) -> bool {
        let carries_body = matches!(self.method, Method::POST | Method::PUT | Method::PATCH);
        carries_body
            && self
                .header(header::CONTENT_TYPE.as_str())
                .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
    }
}

/// Percent-decode the URI path; paths that do not decode to UTF-8 stay raw.
fn decode_path(uri: &Uri) -> String {
    let raw = uri.path();
    match urlencoding::decode(raw) {
        Ok(path) => path.into_owned(),
        Err(e) => {
            tracing::debug!(path = raw, error = %e, "Path is not valid UTF-8 once decoded");
            raw.to_string()
        }
    }
}
