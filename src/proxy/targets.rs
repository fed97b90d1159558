//! Proxy target table construction.
//!
//! # Responsibilities
//! - Flatten both config declaration forms into one ordered prefix table
//! - Compile target URLs and per-target HTTP clients at load time
//!
//! # Design Decisions
//! - Flattening is an explicit load-time transformation: duplicate prefixes
//!   are last-write-wins, with the value replaced in place so the original
//!   declaration position keeps its match precedence
//! - Certificate verification is a per-target client setting; disabling it
//!   is a development-only trust relaxation

use thiserror::Error;
use url::Url;

use crate::config::schema::{ProxySection, ProxyTargetSpec};

/// A compiled upstream target bound to one match prefix.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    /// Request path prefix this target handles.
    pub prefix: String,
    /// Upstream base URL.
    pub destination: Url,
    /// Rewrite the Host header to the destination authority.
    pub rewrite_origin: bool,
    /// Verify the upstream TLS certificate.
    pub verify_upstream_cert: bool,
}

/// Error raised while compiling the target table.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid proxy target {target:?} for prefix {prefix:?}: {source}")]
    Url {
        prefix: String,
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client for prefix {prefix:?}: {source}")]
    Client {
        prefix: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Flatten a proxy declaration into ordered `(prefix, spec)` pairs.
///
/// List entries expand one spec per match context; duplicate prefixes are
/// last-write-wins while keeping the position of the first occurrence.
pub fn flatten(section: &ProxySection) -> Vec<(String, ProxyTargetSpec)> {
    let raw: Vec<(String, ProxyTargetSpec)> = match section {
        ProxySection::Map(map) => map
            .entries()
            .iter()
            .map(|(prefix, entry)| (prefix.clone(), entry.clone().into_spec()))
            .collect(),
        ProxySection::List(entries) => entries
            .iter()
            .flat_map(|entry| {
                entry
                    .context
                    .iter()
                    .map(|prefix| (prefix.clone(), entry.spec.clone()))
            })
            .collect(),
    };

    let mut flat: Vec<(String, ProxyTargetSpec)> = Vec::with_capacity(raw.len());
    for (prefix, spec) in raw {
        match flat.iter_mut().find(|(existing, _)| *existing == prefix) {
            Some((_, slot)) => *slot = spec,
            None => flat.push((prefix, spec)),
        }
    }
    flat
}

impl ProxyTarget {
    /// Compile one flattened pair.
    pub fn compile(prefix: String, spec: &ProxyTargetSpec) -> Result<Self, TargetError> {
        let destination = Url::parse(&spec.target).map_err(|source| TargetError::Url {
            prefix: prefix.clone(),
            target: spec.target.clone(),
            source,
        })?;
        Ok(Self {
            prefix,
            destination,
            rewrite_origin: spec.rewrite_origin,
            verify_upstream_cert: spec.verify_upstream_cert,
        })
    }
}
