//! HTTP surface of the gateway.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, catch-all route)
//!     → request.rs (request ID, body capture into RequestContext)
//!     → pipeline::Pipeline::dispatch
//!     → response to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{start, ServerHandle, StartError};
