//! HTTP edge gateway library.
//!
//! Routes each inbound request by longest path prefix to exactly one
//! upstream, rewrites the path, and streams the upstream response back.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
