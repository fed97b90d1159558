//! Upstream proxying subsystem.
//!
//! # Data Flow
//! ```text
//! proxy config (map or list form)
//!     → targets.rs (flatten to ordered prefix table, compile URLs/clients)
//!     → forwarder.rs (prefix match, forward with body replay)
//!     → cache.rs (optional: replay recorded responses, record new ones)
//! ```
//!
//! # Design Decisions
//! - First declared matching prefix wins, mirroring the Path Matcher's
//!   first-match ordering
//! - Upstream failures surface as 502 and are never retried; the developer
//!   restarts the failing upstream instead

pub mod cache;
pub mod forwarder;
pub mod targets;

pub use cache::{CacheArgs, CacheInterceptor, CacheKeyResolver, CacheStage};
pub use forwarder::Forwarder;
pub use targets::ProxyTarget;
