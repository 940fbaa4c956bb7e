//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → consumed at startup by the server and middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes are fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AssetsConfig, CorsConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
