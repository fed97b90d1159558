//! HTTP server setup.
//!
//! # Responsibilities
//! - Compile the pipeline from a validated configuration
//! - Bind the listener and serve with a catch-all route
//! - Wire up middleware (request ID, tracing)
//! - Expose an explicit server handle for embedding and tests
//!
//! # Design Decisions
//! - `start(config)` returns a [`ServerHandle`] rather than installing
//!   process-global listening state, so multiple independent instances can
//!   coexist (one per test, for example)
//! - Configuration errors abort before the listener binds

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::config::validation::validate_config;
use crate::error::plain_text;
use crate::http::request::{request_id, RequestContext};
use crate::lifecycle::Shutdown;
use crate::pipeline::Pipeline;

/// Error raised before the server starts listening.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind listener: {0}")]
    Bind(std::io::Error),
}

/// Application state injected into the handler.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    max_body_bytes: usize,
}

/// Handle to one running gateway instance.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// The address the gateway is actually bound to (port 0 resolves here).
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown and wait for the serve loop to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.task.await;
        tracing::info!("Gateway stopped");
    }
}

/// Validate the configuration, bind the listener, and serve in a spawned
/// task. Returns once the gateway is accepting connections.
pub async fn start(config: GatewayConfig) -> Result<ServerHandle, StartError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let pipeline = Arc::new(Pipeline::from_config(&config)?);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .map_err(StartError::Bind)?;
    let addr = listener.local_addr().map_err(StartError::Bind)?;

    tracing::info!(
        address = %addr,
        "Gateway listening, you can visit http://{}", addr
    );

    let state = AppState {
        pipeline,
        max_body_bytes: config.server.max_body_bytes,
    };

    let app = Router::new()
        .route("/{*path}", any(gateway_handler))
        .route("/", any(gateway_handler))
        .with_state(state)
        .layer(axum::middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http());

    let shutdown = Shutdown::new();
    let watcher = shutdown.watcher();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(watcher.wait())
            .await
    });

    Ok(ServerHandle {
        addr,
        shutdown,
        task,
    })
}

/// Catch-all handler: capture the request once, then run the pipeline.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let ctx = match RequestContext::capture(request, state.max_body_bytes).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected oversized request body");
            return plain_text(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
        }
    };

    tracing::debug!(
        request_id = %ctx.request_id(),
        method = %ctx.method,
        path = %ctx.path,
        "Dispatching request"
    );

    state.pipeline.dispatch(ctx).await
}
