//! Trellis: a small web framework core.
//!
//! Routes are resolved through a per-method segment trie supporting literal,
//! `:name` and trailing `*name` segments. Each request runs an ordered chain of
//! prefix-scoped group middleware followed by the matched handler, with
//! explicit `next` / `abort` / `fail` control and optional panic recovery.

pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use engine::{Engine, RouterGroup};
pub use http::{Context, HandlerFunc, HttpServer};
pub use lifecycle::Shutdown;
