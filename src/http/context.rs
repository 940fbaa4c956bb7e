//! Per-request context and middleware chain.
//!
//! # Responsibilities
//! - Own the request snapshot, path parameters and response buffer
//! - Drive the ordered handler chain through `next`, `abort` and `fail`
//!
//! # Execution Model
//! ```text
//! chain = [A, B, handler]
//!
//! A: before ─ next() ─┐                      ┌─ after ─▶ done
//!                     B: before ─ next() ─┐  │
//!                                 handler ┘──┘ B: after
//! ```
//! Each handler runs synchronously and calls `next()` to hand control to the
//! rest of the chain. `next()` keeps advancing the cursor until the chain is
//! exhausted, so a handler that returns without calling `next()` does not stop
//! the entries after it; use `abort()` or `fail()` for that. Calling `next()`
//! again once the chain is exhausted does nothing.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::render::{HtmlRenderer, ERROR_TEMPLATE};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::Params;

/// A chain entry: middleware or terminal route handler.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// State for one request. Never shared across requests.
pub struct Context {
    request: Request,
    params: Params,
    response: Response,
    handlers: Vec<HandlerFunc>,
    /// Index of the next chain entry to run.
    index: usize,
    aborted: bool,
    renderer: Arc<dyn HtmlRenderer>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .field("params", &self.params)
            .field("chain_len", &self.handlers.len())
            .field("index", &self.index)
            .field("aborted", &self.aborted)
            .finish()
    }
}

impl Context {
    pub fn new(request: Request, renderer: Arc<dyn HtmlRenderer>) -> Self {
        Self {
            request,
            params: Params::new(),
            response: Response::new(),
            handlers: Vec::new(),
            index: 0,
            aborted: false,
            renderer,
        }
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn set_handlers(&mut self, handlers: Vec<HandlerFunc>) {
        self.handlers = handlers;
        self.index = 0;
    }

    // ---- chain control ----

    /// Run the remaining chain entries in order.
    ///
    /// No-op once the chain has been aborted.
    pub fn next(&mut self) {
        if self.aborted {
            return;
        }
        while self.index < self.handlers.len() {
            if self.aborted {
                break;
            }
            let handler = Arc::clone(&self.handlers[self.index]);
            self.index += 1;
            handler(self);
        }
    }

    /// Stop the chain: every later `next()` call becomes a no-op.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Skip the rest of the chain and render the error page with `code`.
    ///
    /// Unlike `abort`, handlers already waiting in `next()` still run their
    /// post-`next()` code.
    pub fn fail(&mut self, code: StatusCode, message: &str) {
        self.index = self.handlers.len();
        self.html(
            code,
            ERROR_TEMPLATE,
            &json!({
                "errCode": code.as_u16(),
                "errMsg": message,
            }),
        );
    }

    // ---- request ----

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Path parameter bound by the matched route.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.request.query(key)
    }

    /// Form value from a url-encoded body, falling back to the query string.
    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request.form_value(key)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Buffered request body.
    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    // ---- response ----

    /// Write the status line. Only the first call has an effect.
    pub fn status(&mut self, code: StatusCode) {
        self.response.write_status(code);
    }

    /// Last status set for this request.
    ///
    /// This can differ from the status on the wire when a later `status` call
    /// was ignored, as after `fail` following an earlier write.
    pub fn status_code(&self) -> StatusCode {
        self.response.last_status()
    }

    /// Set a response header. Ignored once the status has been written.
    pub fn set_header(&mut self, key: &str, value: &str) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => self.response.set_header(name, value),
            _ => tracing::warn!(header = key, "Invalid response header dropped"),
        }
    }

    /// Plain text response.
    pub fn string(&mut self, code: StatusCode, body: impl AsRef<str>) {
        self.set_header(header::CONTENT_TYPE.as_str(), "text/plain");
        self.status(code);
        self.response.write(body.as_ref().as_bytes());
    }

    /// JSON response. Serialization failure turns into a plain 500.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.set_header(header::CONTENT_TYPE.as_str(), "application/json");
                self.status(code);
                self.response.write(&body);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    /// Raw bytes with no content type.
    pub fn data(&mut self, code: StatusCode, data: &[u8]) {
        self.status(code);
        self.response.write(data);
    }

    /// Render template `name` with `data`.
    ///
    /// A rendering failure ends the chain with a plain 500 response.
    pub fn html(&mut self, code: StatusCode, name: &str, data: &Value) {
        match self.renderer.render(name, data) {
            Ok(page) => {
                self.set_header(header::CONTENT_TYPE.as_str(), "text/html");
                self.status(code);
                self.response.write(page.as_bytes());
            }
            Err(e) => {
                tracing::error!(template = name, error = %e, "Template rendering failed");
                self.index = self.handlers.len();
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}
