//! Startup and shutdown coordination.

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownWatcher};
