//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from TOML.
//!
//! Proxy targets accept two declaration forms, mirroring common dev-proxy
//! configs:
//!
//! ```toml
//! # Map form: prefix → target string or spec table
//! [proxy]
//! "/api" = "http://localhost:3001"
//!
//! [proxy."/admin"]
//! target = "https://localhost:8443"
//! verify_upstream_cert = false
//!
//! # List form: one spec applied to several match contexts
//! [[proxy]]
//! context = ["/api", "/mock"]
//! target = "http://localhost:3001"
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listener configuration (port, host, body capture limit).
    pub server: ServerConfig,

    /// Ordered local Route Rules (fixture mapping).
    pub local_rules: Vec<LocalRuleConfig>,

    /// Upstream proxy targets.
    pub proxy: Option<ProxySection>,

    /// SPA entry path served for requests no other stage handled.
    pub history_api_fallback: Option<PathBuf>,

    /// Response cache key resolution.
    pub cache: Option<CacheConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,

    /// Host/interface to bind.
    pub host: String,

    /// Maximum captured request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// One local Route Rule: requests matching `path` are served from the first
/// existing candidate produced by the `filepath` template(s).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalRuleConfig {
    /// Route pattern: exact path, `*`/`**` wildcards, or raw regex.
    pub path: String,

    /// Filepath template(s); see `routing::resolver` for placeholders.
    pub filepath: OneOrMany<String>,
}

/// Proxy target declaration, map form or list form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxySection {
    /// `[[proxy]]` entries with explicit match contexts.
    List(Vec<ProxyListEntry>),
    /// `[proxy]` table mapping prefix → target, in declaration order.
    Map(OrderedMap<ProxyEntry>),
}

/// One `[[proxy]]` list entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyListEntry {
    /// Path prefixes this spec applies to.
    pub context: Vec<String>,

    #[serde(flatten)]
    pub spec: ProxyTargetSpec,
}

/// Map-form value: a bare target URL string or a full spec table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProxyEntry {
    Target(String),
    Spec(ProxyTargetSpec),
}

impl ProxyEntry {
    pub fn into_spec(self) -> ProxyTargetSpec {
        match self {
            ProxyEntry::Target(target) => ProxyTargetSpec {
                target,
                rewrite_origin: default_true(),
                verify_upstream_cert: default_true(),
            },
            ProxyEntry::Spec(spec) => spec,
        }
    }
}

/// Upstream target settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyTargetSpec {
    /// Upstream base URL, e.g. `http://localhost:3001`.
    pub target: String,

    /// Rewrite the Host header to the target's authority.
    #[serde(default = "default_true")]
    pub rewrite_origin: bool,

    /// Verify the upstream TLS certificate. Disabling this is a
    /// development-only trust relaxation; never use it in production.
    #[serde(default = "default_true")]
    pub verify_upstream_cert: bool,
}

fn default_true() -> bool {
    true
}

/// Cache key resolution: a single template used for both lookup and write,
/// or split lookup candidates + write destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CacheConfig {
    Single(String),
    Split {
        /// Lookup candidates, probed in order; first existing file wins.
        match_cache_filepath: OneOrMany<String>,
        /// Canonical write destination for recorded responses.
        cache_filepath: String,
    },
}

/// A value that may be written as a bare string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// A string-keyed map that preserves declaration order.
///
/// Proxy prefix precedence is positional (first declared prefix wins at
/// match time), so the plain serde map types are not usable here.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn entries(&self) -> &[(String, V)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string-keyed table")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap { entries })
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(std::marker::PhantomData))
    }
}
