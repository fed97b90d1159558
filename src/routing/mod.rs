//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Rule config (pattern string + filepath template)
//!     → pattern.rs (compile once at load)
//!     → resolver.rs (compile filepath templates)
//!     → rules.rs (ordered rule list, frozen)
//!
//! Incoming request path
//!     → rules.rs (first structural match)
//!     → resolver.rs (candidate filepath list)
//!     → files::resolve (first existing candidate served)
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup; invalid patterns abort before listening
//! - First structural match wins; a match with no existing candidate falls
//!   through to the next pipeline stage, never to the next rule
//! - Deterministic: rules evaluated in declaration order

pub mod pattern;
pub mod resolver;
pub mod rules;

pub use pattern::{PathPattern, PatternError};
pub use resolver::{PathResolver, ResolveArgs, Template, TemplateError};
pub use rules::LocalRuleEngine;
