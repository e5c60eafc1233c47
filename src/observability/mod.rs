//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → http::server TraceLayer (one span per request, with request ID)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all subsystems and on to the upstream
//! - Raw upstream errors are logged here, never sent to clients

pub mod logging;

pub use logging::init_logging;
