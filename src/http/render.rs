//! HTML rendering.
//!
//! Handlers render named templates through the [`HtmlRenderer`] seam. The bundled
//! [`Templates`] set loads pages from a directory and fills `{{ key }}` placeholders
//! from a JSON object, HTML-escaping every value. `error.html` and `404.html` fall
//! back to built-in pages when not loaded.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::RenderError;

/// Template rendered by `Context::fail`. Receives `errCode` and `errMsg`.
pub const ERROR_TEMPLATE: &str = "error.html";

/// Template rendered by the default not-found handler. Receives `path`.
pub const NOT_FOUND_TEMPLATE: &str = "404.html";

const BUILTIN_ERROR_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>{{ errCode }}</title></head>\n<body>\n<h1>{{ errCode }}</h1>\n<p>{{ errMsg }}</p>\n</body>\n</html>\n";

const BUILTIN_NOT_FOUND_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head><title>404 Not Found</title></head>\n<body>\n<h1>404 Not Found</h1>\n<p>{{ path }}</p>\n</body>\n</html>\n";

/// Renders a named template with JSON data.
pub trait HtmlRenderer: Send + Sync {
    fn render(&self, name: &str, data: &Value) -> Result<String, RenderError>;
}

/// In-memory template set.
#[derive(Debug, Default, Clone)]
pub struct Templates {
    templates: HashMap<String, String>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.html` and `.tmpl` file directly inside `dir`, keyed by file name.
    pub fn load_dir(dir: &Path) -> Result<Self, RenderError> {
        let io_err = |source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut templates = Self::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_template = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "html" || ext == "tmpl");
            if !path.is_file() || !is_template {
                continue;
            }

            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            templates.insert(name, source);
        }

        tracing::info!(dir = %dir.display(), count = templates.len(), "Templates loaded");
        Ok(templates)
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn source(&self, name: &str) -> Option<&str> {
        if let Some(source) = self.templates.get(name) {
            return Some(source.as_str());
        }
        match name {
            ERROR_TEMPLATE => Some(BUILTIN_ERROR_PAGE),
            NOT_FOUND_TEMPLATE => Some(BUILTIN_NOT_FOUND_PAGE),
            _ => None,
        }
    }
}

impl HtmlRenderer for Templates {
    fn render(&self, name: &str, data: &Value) -> Result<String, RenderError> {
        let source = self
            .source(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))?;
        Ok(fill(source, data))
    }
}

/// Replace `{{ key }}` placeholders. Keys may be dotted paths and may start with a `.`.
/// Unknown keys and nulls render as nothing; unterminated tags are copied verbatim.
fn fill(source: &str, data: &Value) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after_open[..end].trim().trim_start_matches('.');
        if let Some(value) = lookup(data, key) {
            out.push_str(&escape_html(&display(value)));
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

fn lookup<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(data);
    }
    key.split('.').try_fold(data, |value, part| match value {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
