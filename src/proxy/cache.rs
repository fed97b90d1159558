//! Response cache interception.
//!
//! Wraps the Proxy Forwarder when caching is enabled: a request whose cache
//! key resolves to an existing file is served from disk and never reaches
//! the upstream; on a miss the upstream response is fully buffered, the raw
//! body bytes are persisted, and the same bytes are returned to the client.
//!
//! # Design Decisions
//! - The cache key is a pure function of method + normalized path. Query
//!   strings and headers do not participate, so distinct query strings
//!   collapse onto one cache entry. Documented limitation, not a bug.
//! - Concurrent writes to one key are uncoordinated (last write wins);
//!   acceptable for idempotent upstream responses only.
//! - A failed cache write is logged and does not fail the response.
//! - Cache entries are never deleted by the gateway.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Method;
use axum::response::Response;

use crate::config::schema::CacheConfig;
use crate::error::GatewayError;
use crate::files::{self, ServeOptions};
use crate::http::request::RequestContext;
use crate::proxy::forwarder::Matched;
use crate::routing::resolver::{ResolveArgs, Template, TemplateError};

/// Which side of the cache a key is being resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStage {
    /// Lookup before forwarding.
    Hit,
    /// Write destination after a live response.
    Store,
}

/// Request view handed to cache key resolvers.
#[derive(Debug, Clone, Copy)]
pub struct CacheArgs<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub stage: CacheStage,
}

/// Derives cache lookup candidates and the write destination for a request.
///
/// Implement this to supply fully custom key logic; the built-in
/// [`TemplateCacheResolver`] covers the template-configured case.
pub trait CacheKeyResolver: Send + Sync {
    /// Ordered lookup candidates; the first existing file is served.
    fn lookup_paths(&self, args: &CacheArgs<'_>) -> Vec<PathBuf>;

    /// Single canonical write destination, or `None` to skip recording.
    fn write_path(&self, args: &CacheArgs<'_>) -> Option<PathBuf>;
}

/// Built-in resolver rendering configured templates.
pub struct TemplateCacheResolver {
    lookup: Vec<Template>,
    write: Template,
}

impl TemplateCacheResolver {
    pub fn from_config(config: &CacheConfig) -> Result<Self, TemplateError> {
        match config {
            CacheConfig::Single(template) => {
                let template = Template::parse(template)?;
                Ok(Self {
                    lookup: vec![template.clone()],
                    write: template,
                })
            }
            CacheConfig::Split {
                match_cache_filepath,
                cache_filepath,
            } => Ok(Self {
                lookup: match_cache_filepath
                    .as_slice()
                    .iter()
                    .map(|s| Template::parse(s))
                    .collect::<Result<_, _>>()?,
                write: Template::parse(cache_filepath)?,
            }),
        }
    }
}

impl CacheKeyResolver for TemplateCacheResolver {
    fn lookup_paths(&self, args: &CacheArgs<'_>) -> Vec<PathBuf> {
        let resolve_args = ResolveArgs {
            method: args.method,
            path: args.path,
        };
        self.lookup.iter().map(|t| t.render(&resolve_args)).collect()
    }

    fn write_path(&self, args: &CacheArgs<'_>) -> Option<PathBuf> {
        let resolve_args = ResolveArgs {
            method: args.method,
            path: args.path,
        };
        Some(self.write.render(&resolve_args))
    }
}

/// Wraps the forwarder's response path with disk-backed replay.
pub struct CacheInterceptor {
    resolver: Arc<dyn CacheKeyResolver>,
}

impl CacheInterceptor {
    pub fn new(resolver: Arc<dyn CacheKeyResolver>) -> Self {
        Self { resolver }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self, TemplateError> {
        Ok(Self::new(Arc::new(TemplateCacheResolver::from_config(
            config,
        )?)))
    }

    /// Serve from cache if any lookup candidate exists; otherwise forward
    /// through the matched target, recording the response body.
    ///
    /// Only invoked for requests that matched a proxy target prefix.
    pub async fn intercept(&self, ctx: &RequestContext, matched: &Matched<'_>) -> Response {
        let args = CacheArgs {
            method: &ctx.method,
            path: &ctx.path,
            stage: CacheStage::Hit,
        };

        for candidate in self.resolver.lookup_paths(&args) {
            match files::resolve(&candidate, &ServeOptions::default()).await {
                Ok(files::Resolved::File(handle)) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        path = %ctx.path,
                        cache_file = %candidate.display(),
                        "Cache hit, upstream bypassed"
                    );
                    return match handle
                        .into_response(&ServeOptions::default(), Default::default())
                        .await
                    {
                        Ok(response) => response,
                        Err(e) if files::resolve::is_not_found(&e) => {
                            GatewayError::NotFound.into_response()
                        }
                        Err(e) => GatewayError::Filesystem(e).into_response(),
                    };
                }
                Ok(_) => continue,
                Err(e) => return GatewayError::Filesystem(e).into_response(),
            }
        }

        let buffered = match matched.forward_buffered(ctx).await {
            Ok(buffered) => buffered,
            Err(e) => return e.into_response(),
        };

        let write_args = CacheArgs {
            stage: CacheStage::Store,
            ..args
        };
        if let Some(path) = self.resolver.write_path(&write_args) {
            if let Err(e) = write_entry(&path, &buffered.body).await {
                tracing::warn!(
                    cache_file = %path.display(),
                    error = %e,
                    "Failed to record cache entry"
                );
            } else {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    cache_file = %path.display(),
                    bytes = buffered.body.len(),
                    "Recorded upstream response"
                );
            }
        }

        let mut builder = Response::builder().status(buffered.status);
        if let Some(headers) = builder.headers_mut() {
            *headers = buffered.headers;
            // The body was re-buffered; let the server recompute framing.
            headers.remove(axum::http::header::CONTENT_LENGTH);
        }
        builder
            .body(Body::from(buffered.body))
            .unwrap_or_else(|_| {
                crate::error::plain_text(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                )
            })
    }
}

/// Persist raw response bytes, creating parent directories as needed.
async fn write_entry(path: &std::path::Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, body).await
}
