//! Static file serving subsystem.
//!
//! # Data Flow
//! ```text
//! candidate path
//!     → resolve.rs (stat, directory/index handling)
//!     → FileHandle (size, mtime, content type)
//!     → streamed response body (never fully buffered)
//! ```

pub mod resolve;

pub use resolve::{resolve, FileHandle, Resolved, ServeOptions};
