//! Local Development HTTP Gateway
//!
//! Per incoming request the gateway either serves a local file (rule-based
//! fixture mapping), forwards the request to an upstream service (optionally
//! recording the response body to disk for replay), or falls back to a
//! single-page-app entry file.
//!
//! # Architecture Overview
//!
//! ```text
//! request
//!   -> body capture (http/request.rs)
//!   -> Local Rule Engine (routing/rules.rs)       fixture files
//!   -> Cache Interceptor (proxy/cache.rs)         recorded responses
//!   -> Proxy Forwarder (proxy/forwarder.rs)       live upstream
//!   -> Fallback Handler (pipeline/mod.rs)         SPA entry file
//!   -> 404
//! ```
//!
//! Each stage returns `Handled(response)` or `PassThrough`; the first
//! `Handled` wins. See [`http::server::start`] for embedding the gateway in
//! another process or in tests.

// Core subsystems
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod pipeline;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use http::server::{start, ServerHandle, StartError};
pub use pipeline::{Outcome, Pipeline};
