//! Filepath resolution capability.
//!
//! A Route Rule maps a matched request to one or more candidate filesystem
//! paths. The built-in resolvers cover template substitution and fixed
//! paths; embedding applications can implement [`PathResolver`] for fully
//! custom logic.
//!
//! # Template placeholders
//! - `{method}`: request method, e.g. `GET`
//! - `{path}`: request path as received, e.g. `/api/v1/users`
//! - `{flat_path}`: path with the leading slash removed and the remaining
//!   separators mapped to `__`, e.g. `api__v1__users`
//! - `{ext}`: path extension without the dot, empty when there is none
//!
//! Unknown placeholders are rejected at configuration load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

/// Request view handed to filepath resolvers.
#[derive(Debug, Clone, Copy)]
pub struct ResolveArgs<'a> {
    pub method: &'a Method,
    pub path: &'a str,
}

/// Computes candidate filesystem paths for a matched request.
///
/// Candidates are probed in the order returned; the first existing one is
/// served.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, args: &ResolveArgs<'_>) -> Vec<PathBuf>;
}

/// Error raised when a filepath template fails to parse.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown placeholder {{{name}}} in template {template:?}")]
    UnknownPlaceholder { template: String, name: String },

    #[error("unclosed placeholder in template {template:?}")]
    Unclosed { template: String },
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Method,
    Path,
    FlatPath,
    Ext,
}

/// A compiled filepath template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template string. Called once at configuration load.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| TemplateError::Unclosed {
                template: template.to_string(),
            })?;
            let name = &after[..close];
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(match name {
                "method" => Segment::Method,
                "path" => Segment::Path,
                "flat_path" => Segment::FlatPath,
                "ext" => Segment::Ext,
                other => {
                    return Err(TemplateError::UnknownPlaceholder {
                        template: template.to_string(),
                        name: other.to_string(),
                    })
                }
            });
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Render the template for one request.
    pub fn render(&self, args: &ResolveArgs<'_>) -> PathBuf {
        let mut out = String::with_capacity(self.source.len() + args.path.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Method => out.push_str(args.method.as_str()),
                Segment::Path => out.push_str(args.path),
                Segment::FlatPath => out.push_str(&flatten_path(args.path)),
                Segment::Ext => out.push_str(path_extension(args.path)),
            }
        }
        PathBuf::from(out)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Map a request path to a filesystem-safe flat key: leading slash removed,
/// remaining separators replaced with `__`.
pub fn flatten_path(path: &str) -> String {
    path.trim_start_matches('/').replace('/', "__")
}

fn path_extension(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Resolver rendering one or more templates in order.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    templates: Vec<Template>,
}

impl TemplateResolver {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn parse_all<S: AsRef<str>>(sources: &[S]) -> Result<Self, TemplateError> {
        let templates = sources
            .iter()
            .map(|s| Template::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(templates))
    }
}

impl PathResolver for TemplateResolver {
    fn resolve(&self, args: &ResolveArgs<'_>) -> Vec<PathBuf> {
        self.templates.iter().map(|t| t.render(args)).collect()
    }
}

/// Resolver returning a fixed candidate list regardless of the request.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    paths: Vec<PathBuf>,
}

impl StaticResolver {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl PathResolver for StaticResolver {
    fn resolve(&self, _args: &ResolveArgs<'_>) -> Vec<PathBuf> {
        self.paths.clone()
    }
}

/// Escape hatch: wrap an arbitrary closure as a resolver.
pub struct FnResolver<F>(pub F);

impl<F> PathResolver for FnResolver<F>
where
    F: Fn(&ResolveArgs<'_>) -> Vec<PathBuf> + Send + Sync,
{
    fn resolve(&self, args: &ResolveArgs<'_>) -> Vec<PathBuf> {
        (self.0)(args)
    }
}

/// Convenience alias for shared resolvers.
pub type SharedResolver = Arc<dyn PathResolver>;

#[cfg(test)]
mod tests {
    use super::*;

    fn args<'a>(method: &'a Method, path: &'a str) -> ResolveArgs<'a> {
        ResolveArgs { method, path }
    }

    #[test]
    fn test_template_substitution() {
        let template = Template::parse("fixtures/{method}__{flat_path}.json").unwrap();
        let rendered = template.render(&args(&Method::GET, "/api/v1/users"));
        assert_eq!(rendered, PathBuf::from("fixtures/GET__api__v1__users.json"));
    }

    #[test]
    fn test_path_and_ext_placeholders() {
        let template = Template::parse("web{path}").unwrap();
        let rendered = template.render(&args(&Method::GET, "/img/logo.png"));
        assert_eq!(rendered, PathBuf::from("web/img/logo.png"));

        let template = Template::parse("{ext}").unwrap();
        assert_eq!(
            template.render(&args(&Method::GET, "/img/logo.png")),
            PathBuf::from("png")
        );
        assert_eq!(
            template.render(&args(&Method::GET, "/dashboard")),
            PathBuf::from("")
        );
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let err = Template::parse("cache/{querystring}.json").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder { .. }));
    }

    #[test]
    fn test_unclosed_placeholder_rejected() {
        let err = Template::parse("cache/{method.json").unwrap_err();
        assert!(matches!(err, TemplateError::Unclosed { .. }));
    }

    #[test]
    fn test_template_resolver_candidate_order() {
        let resolver = TemplateResolver::parse_all(&[
            "data/{method}__{flat_path}.json",
            ".cache/{method}__{flat_path}.json",
        ])
        .unwrap();
        let candidates = resolver.resolve(&args(&Method::GET, "/api/ping"));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("data/GET__api__ping.json"),
                PathBuf::from(".cache/GET__api__ping.json"),
            ]
        );
    }

    #[test]
    fn test_fn_resolver_escape_hatch() {
        let resolver = FnResolver(|args: &ResolveArgs<'_>| {
            vec![PathBuf::from(format!("custom/{}", args.method))]
        });
        assert_eq!(
            resolver.resolve(&args(&Method::POST, "/any")),
            vec![PathBuf::from("custom/POST")]
        );
    }
}
