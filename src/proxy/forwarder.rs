//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Select the handling target by first declared matching path prefix
//! - Rebuild the upstream request, replaying the captured body
//! - Stream the upstream response back unmodified
//!
//! # Design Decisions
//! - Hop-by-hop headers are stripped in both directions
//! - `rewrite_origin` controls the Host header: rewritten to the target
//!   authority when enabled, original Host preserved otherwise
//! - One client per target so certificate verification stays per-target

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;

use crate::config::schema::ProxySection;
use crate::error::GatewayError;
use crate::http::request::RequestContext;
use crate::proxy::targets::{self, ProxyTarget, TargetError};

/// Headers that must not travel past a single hop.
const HOP_BY_HOP: &[header::HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Ordered table of compiled upstream targets.
pub struct Forwarder {
    targets: Vec<CompiledTarget>,
}

struct CompiledTarget {
    target: ProxyTarget,
    client: reqwest::Client,
}

/// A target selected for one request.
pub struct Matched<'a> {
    target: &'a ProxyTarget,
    client: &'a reqwest::Client,
}

/// A fully buffered upstream response, used by the cache interceptor.
#[derive(Debug)]
pub struct BufferedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Forwarder {
    /// Compile the flattened target table and per-target clients.
    pub fn from_config(section: &ProxySection) -> Result<Self, TargetError> {
        let mut compiled = Vec::new();
        for (prefix, spec) in targets::flatten(section) {
            let target = ProxyTarget::compile(prefix, &spec)?;

            let mut builder = reqwest::Client::builder().no_proxy();
            if !target.verify_upstream_cert {
                // Development-only trust relaxation; unsafe for production.
                builder = builder.danger_accept_invalid_certs(true);
            }
            let client = builder.build().map_err(|source| TargetError::Client {
                prefix: target.prefix.clone(),
                source,
            })?;

            compiled.push(CompiledTarget { target, client });
        }
        Ok(Self { targets: compiled })
    }

    /// First declared prefix matching the request path wins.
    pub fn match_target(&self, path: &str) -> Option<Matched<'_>> {
        self.targets
            .iter()
            .find(|entry| path.starts_with(&entry.target.prefix))
            .map(|entry| Matched {
                target: &entry.target,
                client: &entry.client,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Matched<'_> {
    pub fn target(&self) -> &ProxyTarget {
        self.target
    }

    /// Forward and stream the upstream response through unmodified.
    pub async fn forward_streaming(&self, ctx: &RequestContext) -> Response {
        let upstream = match self.send(ctx).await {
            Ok(response) => response,
            Err(e) => return GatewayError::Upstream(e).into_response(),
        };

        let mut builder = Response::builder().status(upstream.status());
        if let Some(headers) = builder.headers_mut() {
            *headers = filter_headers(upstream.headers());
        }
        builder
            .body(Body::from_stream(upstream.bytes_stream()))
            .unwrap_or_else(|_| {
                crate::error::plain_text(StatusCode::BAD_GATEWAY, "Bad Gateway")
            })
    }

    /// Forward with full response buffering, for the cache interceptor.
    pub async fn forward_buffered(
        &self,
        ctx: &RequestContext,
    ) -> Result<BufferedResponse, GatewayError> {
        let upstream = self.send(ctx).await?;
        let status = upstream.status();
        let headers = filter_headers(upstream.headers());
        let body = upstream.bytes().await?;
        Ok(BufferedResponse {
            status,
            headers,
            body,
        })
    }

    async fn send(&self, ctx: &RequestContext) -> Result<reqwest::Response, reqwest::Error> {
        let mut url = self.target.destination.clone();
        url.set_path(&ctx.path);
        url.set_query(ctx.query.as_deref());

        let mut headers = filter_headers(&ctx.headers);
        headers.remove(header::CONTENT_LENGTH);
        if self.target.rewrite_origin {
            // The client derives Host from the target URL.
            headers.remove(header::HOST);
        }

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method,
            path = %ctx.path,
            target = %self.target.destination,
            "Forwarding to upstream"
        );

        self.client
            .request(ctx.method.clone(), url)
            .headers(headers)
            .body(ctx.body.clone())
            .send()
            .await
    }
}

fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = headers.clone();
    for name in HOP_BY_HOP {
        filtered.remove(name);
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GatewayConfig;

    fn forwarder(toml: &str) -> Forwarder {
        let config: GatewayConfig = toml::from_str(toml).unwrap();
        Forwarder::from_config(&config.proxy.unwrap()).unwrap()
    }

    #[test]
    fn test_first_declared_prefix_wins() {
        let fwd = forwarder(
            r#"
            [proxy]
            "/api/v2" = "http://localhost:3002"
            "/api" = "http://localhost:3001"
            "#,
        );
        let matched = fwd.match_target("/api/v2/users").unwrap();
        assert_eq!(matched.target().destination.as_str(), "http://localhost:3002/");

        let matched = fwd.match_target("/api/ping").unwrap();
        assert_eq!(matched.target().destination.as_str(), "http://localhost:3001/");

        assert!(fwd.match_target("/web/index.html").is_none());
    }

    #[test]
    fn test_hop_by_hop_headers_stripped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert(header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());

        let filtered = filter_headers(&headers);
        assert!(!filtered.contains_key(header::CONNECTION));
        assert!(!filtered.contains_key(header::TRANSFER_ENCODING));
        assert!(filtered.contains_key(header::ACCEPT));
    }
}
