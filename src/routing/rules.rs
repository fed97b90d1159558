//! Local Rule Engine.
//!
//! # Responsibilities
//! - Evaluate ordered Route Rules against the request path
//! - Probe the matching rule's candidate files in order
//! - Serve the first existing candidate via the Static File Resolver
//!
//! # Design Decisions
//! - First structural match wins: when the matching rule yields no existing
//!   candidate the request falls through to the next pipeline stage, never
//!   to the next rule. One pattern can therefore encode a prioritized list
//!   of fallback file locations (checked-in fixtures first, then a
//!   previously recorded cache).

use std::sync::Arc;

use crate::config::schema::LocalRuleConfig;
use crate::error::GatewayError;
use crate::files::{self, ServeOptions};
use crate::http::request::RequestContext;
use crate::pipeline::Outcome;
use crate::routing::pattern::PathPattern;
use crate::routing::resolver::{PathResolver, ResolveArgs, TemplateResolver};
use crate::config::validation::ValidationError;

/// One compiled Route Rule.
pub struct LocalRule {
    pattern: PathPattern,
    resolver: Arc<dyn PathResolver>,
}

impl LocalRule {
    pub fn new(pattern: PathPattern, resolver: Arc<dyn PathResolver>) -> Self {
        Self { pattern, resolver }
    }
}

/// Ordered, immutable rule list, compiled once at configuration load.
pub struct LocalRuleEngine {
    rules: Vec<LocalRule>,
}

impl LocalRuleEngine {
    /// Compile configured rules. Pattern or template errors abort startup.
    pub fn from_config(configs: &[LocalRuleConfig]) -> Result<Self, ValidationError> {
        let mut rules = Vec::with_capacity(configs.len());
        for config in configs {
            let pattern = PathPattern::compile(&config.path)?;
            let resolver = TemplateResolver::parse_all(config.filepath.as_slice())?;
            rules.push(LocalRule::new(pattern, Arc::new(resolver)));
        }
        Ok(Self { rules })
    }

    /// Escape hatch for embedding applications supplying custom resolvers.
    pub fn with_rules(rules: Vec<LocalRule>) -> Self {
        Self { rules }
    }

    /// Evaluate the rules for one request.
    pub async fn handle(&self, ctx: &RequestContext) -> Outcome {
        let Some(rule) = self.rules.iter().find(|r| r.pattern.matches(&ctx.path)) else {
            return Outcome::PassThrough;
        };

        let args = ResolveArgs {
            method: &ctx.method,
            path: &ctx.path,
        };
        for candidate in rule.resolver.resolve(&args) {
            // A probe error can mean "cannot exist" (e.g. ENOTDIR when a
            // parent component is a regular file); those count as missing.
            match tokio::fs::metadata(&candidate).await {
                Ok(_) => {}
                Err(e) if files::resolve::is_not_found(&e) => continue,
                Err(e) => {
                    return Outcome::Handled(GatewayError::Filesystem(e).into_response());
                }
            }

            tracing::debug!(
                request_id = %ctx.request_id(),
                path = %ctx.path,
                filepath = %candidate.display(),
                "Local rule matched"
            );

            let options = ServeOptions::default();
            return match files::resolve(&candidate, &options).await {
                Ok(files::Resolved::File(handle)) => {
                    match handle.into_response(&options, Default::default()).await {
                        Ok(response) => Outcome::Handled(response),
                        Err(e) if files::resolve::is_not_found(&e) => {
                            Outcome::Handled(GatewayError::NotFound.into_response())
                        }
                        Err(e) => Outcome::Handled(GatewayError::Filesystem(e).into_response()),
                    }
                }
                // Existence raced with deletion between probe and stat.
                Ok(files::Resolved::NotFound) => {
                    Outcome::Handled(GatewayError::NotFound.into_response())
                }
                // Candidate is a directory; not servable without an index.
                Ok(files::Resolved::Passthrough) => Outcome::PassThrough,
                Err(e) => Outcome::Handled(GatewayError::Filesystem(e).into_response()),
            };
        }

        // Matching rule, no existing candidate: next stage, not next rule.
        Outcome::PassThrough
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
