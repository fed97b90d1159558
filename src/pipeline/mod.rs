//! Pipeline orchestration.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → Local Rule Engine       (fixture files)
//!     → Cache Interceptor       (recorded responses, when configured)
//!     → Proxy Forwarder         (live upstream)
//!     → Fallback Handler        (SPA entry file, when configured)
//!     → 404
//! ```
//!
//! # Design Decisions
//! - Short-circuiting is a first-class return value: each stage yields
//!   `Handled(response)` or `PassThrough`, never mutates shared state
//! - The orchestrator holds no routing logic beyond ordering and
//!   short-circuit propagation
//! - Exactly one of {local rule, cache hit, proxy, fallback, 404} responds

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::response::Response;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::error::{plain_text, GatewayError};
use crate::files::{self, ServeOptions};
use crate::http::request::RequestContext;
use crate::proxy::{CacheInterceptor, Forwarder};
use crate::routing::rules::LocalRuleEngine;

/// Result of one pipeline stage.
pub enum Outcome {
    /// Terminal response; later stages never run.
    Handled(Response),
    /// The stage declined; the next stage receives the request.
    PassThrough,
}

/// Terminal stage serving one fixed entry file for unmatched routes, so
/// client-side-routed single-page applications receive their app shell.
pub struct FallbackHandler {
    path: PathBuf,
    options: ServeOptions,
}

impl FallbackHandler {
    /// `index.html` is appended when the configured path has no extension
    /// (a directory-style fallback like `./web`).
    pub fn new(path: PathBuf) -> Self {
        let index = match path.extension() {
            Some(_) => None,
            None => Some("index.html".to_string()),
        };
        Self {
            path,
            options: ServeOptions {
                index,
                ..Default::default()
            },
        }
    }

    pub async fn handle(&self, ctx: &RequestContext) -> Response {
        tracing::debug!(
            request_id = %ctx.request_id(),
            path = %ctx.path,
            entry = %self.path.display(),
            "Serving SPA fallback"
        );
        match files::resolve(&self.path, &self.options).await {
            Ok(files::Resolved::File(handle)) => {
                match handle.into_response(&self.options, Default::default()).await {
                    Ok(response) => response,
                    Err(e) if files::resolve::is_not_found(&e) => {
                        GatewayError::NotFound.into_response()
                    }
                    Err(e) => GatewayError::Filesystem(e).into_response(),
                }
            }
            Ok(_) => GatewayError::NotFound.into_response(),
            Err(e) => GatewayError::Filesystem(e).into_response(),
        }
    }

    pub fn entry_path(&self) -> &Path {
        &self.path
    }
}

/// The assembled per-request stage chain.
pub struct Pipeline {
    rules: Option<LocalRuleEngine>,
    forwarder: Option<Forwarder>,
    cache: Option<CacheInterceptor>,
    fallback: Option<FallbackHandler>,
}

impl Pipeline {
    /// Compile every stage from a validated configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let rules = if config.local_rules.is_empty() {
            None
        } else {
            Some(
                LocalRuleEngine::from_config(&config.local_rules)
                    .map_err(|e| ConfigError::Validation(vec![e]))?,
            )
        };

        let forwarder = match &config.proxy {
            Some(section) => Some(
                Forwarder::from_config(section)
                    .map_err(|e| ConfigError::Validation(vec![e.into()]))?,
            ),
            None => None,
        };

        let cache = match &config.cache {
            Some(cache_config) => Some(
                CacheInterceptor::from_config(cache_config)
                    .map_err(|e| ConfigError::Validation(vec![e.into()]))?,
            ),
            None => None,
        };

        let fallback = config
            .history_api_fallback
            .clone()
            .map(FallbackHandler::new);
        if let Some(handler) = &fallback {
            tracing::info!(
                entry = %handler.entry_path().display(),
                "History API fallback enabled"
            );
        }

        Ok(Self {
            rules,
            forwarder,
            cache,
            fallback,
        })
    }

    /// Run one request through the ordered stage chain.
    pub async fn dispatch(&self, ctx: RequestContext) -> Response {
        if let Some(rules) = &self.rules {
            if let Outcome::Handled(response) = rules.handle(&ctx).await {
                return response;
            }
        }

        if let Some(forwarder) = &self.forwarder {
            if let Some(matched) = forwarder.match_target(&ctx.path) {
                // Cache interception only applies to requests that matched
                // a proxy target prefix.
                return match &self.cache {
                    Some(cache) => cache.intercept(&ctx, &matched).await,
                    None => matched.forward_streaming(&ctx).await,
                };
            }
        }

        if let Some(fallback) = &self.fallback {
            return fallback.handle(&ctx).await;
        }

        plain_text(StatusCode::NOT_FOUND, "Not Found")
    }
}
