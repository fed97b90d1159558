//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks: patterns, templates, target URLs)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into the pipeline at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Server fields (port, host) have defaults; routing and proxy targets
//!   are never silently defaulted
//! - Validation reports all errors, not just the first
//! - A missing config file falls back to built-in defaults (server only)

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    CacheConfig, GatewayConfig, LocalRuleConfig, OneOrMany, ProxySection, ProxyTargetSpec,
    ServerConfig,
};
pub use validation::{validate_config, ValidationError};
