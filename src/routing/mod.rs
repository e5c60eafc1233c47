//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (dot-segment check, route lookup)
//!     → registry.rs (longest-prefix match via matcher.rs)
//!     → rewrite.rs (outbound path for the upstream)
//!     → forwarder, or NotFound
//!
//! Route Compilation (at startup):
//!     UpstreamConfig[]
//!     → Validate prefixes and upstream URLs
//!     → Reject duplicates
//!     → Sort by prefix length and freeze as immutable registry
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Longest prefix wins, independent of registration order

pub mod matcher;
pub mod registry;
pub mod rewrite;
pub mod router;

pub use registry::{RegistryBuilder, Route, UpstreamRegistry};
pub use rewrite::{rewrite, RewriteRule};
pub use router::Router;
