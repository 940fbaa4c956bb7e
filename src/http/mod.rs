//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body limit)
//!     → request.rs (buffered, immutable request snapshot)
//!     → engine (route + group lookup, chain assembly)
//!     → context.rs (middleware chain: next / abort / fail)
//!     → response.rs (buffered status, headers, body)
//!     → Send to client
//! ```

pub mod context;
pub mod middleware;
pub mod render;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use context::{Context, HandlerFunc};
pub use render::{HtmlRenderer, Templates};
pub use request::{MakeRequestUuid, Request, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
