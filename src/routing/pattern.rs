//! Route pattern compilation and matching.
//!
//! # Responsibilities
//! - Compile a pattern string into a matcher, once, at load time
//! - Evaluate compiled matchers against a request path
//!
//! # Pattern forms
//! - Exact literal: `/api/health` (trailing slash tolerated)
//! - Wildcards: `*` matches within one segment, `**` across segments
//! - Raw regex: any pattern containing regex metacharacters beyond `*`,
//!   anchored at both ends with an optional trailing slash
//!
//! # Design Decisions
//! - Invalid patterns fail at load time, never at request time
//! - Matching is O(pattern length) per call, no re-compilation

use regex::Regex;
use thiserror::Error;

/// Error raised when a pattern fails to compile.
#[derive(Debug, Error)]
#[error("invalid route pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub enum PathPattern {
    /// Literal path, compared by equality (optional trailing slash).
    Exact(String),
    /// Wildcard or raw-regex pattern compiled to an anchored regex.
    Regex(Regex),
}

/// Characters that force raw-regex interpretation of a pattern.
const REGEX_META: &[char] = &['(', ')', '[', ']', '^', '$', '+', '?', '|', '\\'];

impl PathPattern {
    /// Compile a pattern string. Called once at configuration load.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.contains(REGEX_META) {
            // Raw regex, anchored like path-to-regexp: full match with an
            // optional trailing slash.
            let anchored = format!("^(?:{})/?$", pattern);
            let regex = Regex::new(&anchored).map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })?;
            Ok(PathPattern::Regex(regex))
        } else if pattern.contains('*') {
            let regex = Regex::new(&wildcard_to_regex(pattern)).map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })?;
            Ok(PathPattern::Regex(regex))
        } else {
            Ok(PathPattern::Exact(pattern.trim_end_matches('/').to_string()))
        }
    }

    /// Evaluate the compiled pattern against a request path.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => {
                let trimmed = if path.len() > 1 {
                    path.trim_end_matches('/')
                } else {
                    path
                };
                trimmed == expected || (expected.is_empty() && path == "/")
            }
            PathPattern::Regex(regex) => regex.is_match(path),
        }
    }
}

/// Translate `*` / `**` wildcards into an anchored regex.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '.' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push_str("/?$");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern() {
        let pattern = PathPattern::compile("/api/health").unwrap();
        assert!(pattern.matches("/api/health"));
        assert!(pattern.matches("/api/health/")); // Trailing slash tolerated
        assert!(!pattern.matches("/api/healthz"));
        assert!(!pattern.matches("/api"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::compile("/").unwrap();
        assert!(pattern.matches("/"));
        assert!(!pattern.matches("/index"));
    }

    #[test]
    fn test_single_segment_wildcard() {
        let pattern = PathPattern::compile("/static/*.js").unwrap();
        assert!(pattern.matches("/static/app.js"));
        assert!(!pattern.matches("/static/vendor/app.js"));
        assert!(!pattern.matches("/static/app.css"));
    }

    #[test]
    fn test_multi_segment_wildcard() {
        let pattern = PathPattern::compile("/assets/**").unwrap();
        assert!(pattern.matches("/assets/app.js"));
        assert!(pattern.matches("/assets/img/logo.png"));
        assert!(!pattern.matches("/api/assets"));
    }

    #[test]
    fn test_wildcard_pattern_braces_are_literal() {
        // Braces do not force raw-regex interpretation, so they must not
        // become a repetition in the translated wildcard regex.
        let pattern = PathPattern::compile("/a{2}/*").unwrap();
        assert!(pattern.matches("/a{2}/x"));
        assert!(!pattern.matches("/aa/x"));
    }

    #[test]
    fn test_raw_regex_pattern() {
        let pattern = PathPattern::compile("/api/v1/(.*)").unwrap();
        assert!(pattern.matches("/api/v1/users"));
        assert!(pattern.matches("/api/v1/users/42"));
        assert!(!pattern.matches("/api/v2/users"));
    }

    #[test]
    fn test_regex_is_fully_anchored() {
        let pattern = PathPattern::compile("/api/(ping|pong)").unwrap();
        assert!(pattern.matches("/api/ping"));
        assert!(!pattern.matches("/api/pinged"));
        assert!(!pattern.matches("/x/api/ping"));
    }

    #[test]
    fn test_invalid_pattern_fails_at_compile() {
        let err = PathPattern::compile("/api/(unclosed").unwrap_err();
        assert!(err.to_string().contains("/api/(unclosed"));
    }
}
