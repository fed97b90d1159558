//! Gateway error taxonomy.
//!
//! # Responsibilities
//! - Map stage failures to HTTP statuses at the stage boundary
//! - Keep filesystem detail out of response bodies (logged server-side)
//!
//! # Design Decisions
//! - Errors inside one pipeline stage never abort the process; they are
//!   translated to a plain-text HTTP response at that stage
//! - Configuration errors are fatal at startup and never reach this type

use axum::http::{header, StatusCode};
use axum::response::Response;
use thiserror::Error;

/// Request-time error raised by a pipeline stage.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// File or directory missing (or unresolvable filename).
    #[error("not found")]
    NotFound,

    /// Any other OS-level I/O failure.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// Upstream connection failure. Never retried; the developer is
    /// expected to restart the failing upstream.
    #[error("upstream unreachable: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Filesystem(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Translate into a minimal plain-text response. The error detail is
    /// logged here and never leaks into the body.
    pub fn into_response(self) -> Response {
        match &self {
            GatewayError::NotFound => {}
            GatewayError::Filesystem(e) => {
                tracing::error!(error = %e, "Filesystem error while handling request");
            }
            GatewayError::Upstream(e) => {
                tracing::error!(error = %e, "Upstream request failed");
            }
        }
        plain_text(self.status(), status_body(self.status()))
    }
}

fn status_body(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::BAD_GATEWAY => "Bad Gateway",
        _ => "Internal Server Error",
    }
}

/// Build a plain-text response with the given status.
pub fn plain_text(status: StatusCode, body: &'static str) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(axum::body::Body::from(body))
        .unwrap_or_else(|_| Response::new(axum::body::Body::empty()))
}
