//! Error types shared across subsystems.
//!
//! Configuration errors live in [`crate::config::loader`] next to the loader.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce an HTML page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{0}` is not defined")]
    UnknownTemplate(String),

    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(String),
}
