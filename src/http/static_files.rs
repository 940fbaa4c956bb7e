//! Static file serving.
//!
//! # Responsibilities
//! - Map the `*filepath` capture of a static route onto a directory
//! - Refuse paths escaping that directory
//! - Pick a content type from the file extension
//!
//! # Design Decisions
//! - Files are read synchronously; the chain already runs on a blocking worker
//! - A missing file only sets 404; the body is left to outer middleware

use std::fs;
use std::path::{Component, Path, PathBuf};

use axum::http::{header, StatusCode};

use crate::http::context::Context;

/// Name of the wildcard parameter static routes register.
pub const FILEPATH_PARAM: &str = "filepath";

/// Handler serving files below `root` for a route ending in `*filepath`.
pub fn static_handler(root: PathBuf) -> impl Fn(&mut Context) + Send + Sync + 'static {
    move |c: &mut Context| {
        let requested = c.param(FILEPATH_PARAM).unwrap_or_default();
        let Some(path) = resolve(&root, requested) else {
            tracing::debug!(requested, "Static path rejected");
            c.status(StatusCode::NOT_FOUND);
            return;
        };

        match fs::read(&path) {
            Ok(contents) => {
                c.set_header(header::CONTENT_TYPE.as_str(), &content_type(&path));
                c.data(StatusCode::OK, &contents);
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file not found");
                c.status(StatusCode::NOT_FOUND);
            }
        }
    }
}

/// Join `requested` onto `root`, accepting only plain path components.
/// Directories resolve to their `index.html`.
pub fn resolve(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let path = root.join(relative);
    if path.is_dir() {
        Some(path.join("index.html"))
    } else {
        Some(path)
    }
}

/// Content type for a file, guessed from its extension.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}
