//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) as early as possible
//! - Capture the request body once into a replayable buffer
//! - Extract routing-relevant information (method, path, query, headers)
//!
//! # Design Decisions
//! - The body is buffered exactly once, before any stage reads it, so the
//!   Proxy Forwarder can re-emit it byte-for-byte even though earlier
//!   stages may have inspected the request
//! - Body capture is bounded; oversized bodies are rejected with 413

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{header::HeaderName, HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Middleware assigning a request ID and echoing it on the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = match request.headers().get(&X_REQUEST_ID) {
        Some(existing) => existing.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or(HeaderValue::from_static("unknown"));
            request.headers_mut().insert(&X_REQUEST_ID, generated.clone());
            generated
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().entry(&X_REQUEST_ID).or_insert(id);
    response
}

/// Per-request transient view threaded through the pipeline.
///
/// Owned exclusively by the pipeline for the duration of one request. The
/// captured body is a cheaply cloneable [`Bytes`], replayable by the Proxy
/// Forwarder.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Error raised when the request body exceeds the capture limit.
#[derive(Debug, thiserror::Error)]
#[error("request body exceeds capture limit of {limit} bytes")]
pub struct BodyTooLarge {
    pub limit: usize,
}

impl RequestContext {
    /// Buffer the request into an immutable context.
    pub async fn capture(
        request: Request<Body>,
        max_body_bytes: usize,
    ) -> Result<Self, BodyTooLarge> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, max_body_bytes)
            .await
            .map_err(|_| BodyTooLarge {
                limit: max_body_bytes,
            })?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(ToString::to_string),
            headers: parts.headers,
            body,
        })
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}
