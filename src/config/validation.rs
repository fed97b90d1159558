//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile-check route patterns and filepath templates
//! - Validate proxy target URLs and match prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Runs before the listener binds; a failing config never serves traffic

use thiserror::Error;
use url::Url;

use crate::config::schema::{CacheConfig, GatewayConfig};
use crate::routing::pattern::PathPattern;
use crate::routing::resolver::Template;

/// A single semantic configuration error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Pattern(#[from] crate::routing::pattern::PatternError),

    #[error("{0}")]
    Template(#[from] crate::routing::resolver::TemplateError),

    #[error("{0}")]
    Proxy(#[from] crate::proxy::targets::TargetError),

    #[error("invalid proxy target {target:?} for prefix {prefix:?}: {reason}")]
    Target {
        prefix: String,
        target: String,
        reason: String,
    },

    #[error("proxy match prefix must not be empty")]
    EmptyPrefix,

    #[error("history_api_fallback path must not be empty")]
    EmptyFallback,

    #[error("cache is configured but no proxy targets are declared")]
    CacheWithoutProxy,
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for rule in &config.local_rules {
        if let Err(e) = PathPattern::compile(&rule.path) {
            errors.push(e.into());
        }
        for template in rule.filepath.as_slice() {
            if let Err(e) = Template::parse(template) {
                errors.push(e.into());
            }
        }
    }

    if let Some(proxy) = &config.proxy {
        for (prefix, spec) in crate::proxy::targets::flatten(proxy) {
            if prefix.is_empty() {
                errors.push(ValidationError::EmptyPrefix);
            }
            match Url::parse(&spec.target) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
                Ok(url) => errors.push(ValidationError::Target {
                    prefix: prefix.clone(),
                    target: spec.target.clone(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                }),
                Err(e) => errors.push(ValidationError::Target {
                    prefix: prefix.clone(),
                    target: spec.target.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    if let Some(cache) = &config.cache {
        if config.proxy.is_none() {
            errors.push(ValidationError::CacheWithoutProxy);
        }
        let templates: Vec<&str> = match cache {
            CacheConfig::Single(template) => vec![template.as_str()],
            CacheConfig::Split {
                match_cache_filepath,
                cache_filepath,
            } => {
                let mut all: Vec<&str> = match_cache_filepath
                    .as_slice()
                    .iter()
                    .map(String::as_str)
                    .collect();
                all.push(cache_filepath.as_str());
                all
            }
        };
        for template in templates {
            if let Err(e) = Template::parse(template) {
                errors.push(e.into());
            }
        }
    }

    if let Some(fallback) = &config.history_api_fallback {
        if fallback.as_os_str().is_empty() {
            errors.push(ValidationError::EmptyFallback);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
