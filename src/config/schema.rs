//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// CORS middleware settings.
    pub cors: CorsConfig,

    /// Static files and templates.
    pub assets: AssetsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9999").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9999".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub log_filter: String,

    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "trellis=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// CORS middleware configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Install the CORS middleware on the root group.
    pub enabled: bool,

    /// `Access-Control-Allow-Origin` value.
    pub allow_origin: String,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// `Access-Control-Allow-Headers` entries.
    pub allow_headers: Vec<String>,

    /// `Access-Control-Allow-Methods` entries.
    pub allow_methods: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        let headers = [
            "Content-Type",
            "Content-Length",
            "Accept-Encoding",
            "X-CSRF-Token",
            "Authorization",
            "accept",
            "origin",
            "Cache-Control",
            "X-Requested-With",
        ];
        Self {
            enabled: false,
            allow_origin: "*".to_string(),
            allow_credentials: true,
            allow_headers: headers.iter().map(|h| h.to_string()).collect(),
            allow_methods: ["POST", "OPTIONS", "GET", "PUT"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Static files and template locations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AssetsConfig {
    /// URL prefix static files are served under (e.g., "/assets").
    pub static_prefix: Option<String>,

    /// Directory static files are read from.
    pub static_dir: Option<String>,

    /// Directory HTML templates are loaded from.
    pub templates_dir: Option<String>,
}
