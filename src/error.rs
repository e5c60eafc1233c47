//! Per-request gateway errors.
//!
//! Startup failures are [`crate::config::ConfigError`]; everything here is
//! recoverable and becomes a JSON response via `http::response`.

use thiserror::Error;

use crate::proxy::UpstreamError;

/// A failure while handling a single request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No registered prefix matches the path.
    #[error("no route for path '{path}'")]
    NotFound { path: String },

    /// The matched upstream could not be reached or did not answer in time.
    #[error("{label} upstream failed: {source}")]
    Upstream {
        label: String,
        #[source]
        source: UpstreamError,
    },

    /// Inbound body exceeds the configured limit.
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Inbound body could not be read.
    #[error("failed to read request body: {0}")]
    BadRequest(String),
}
