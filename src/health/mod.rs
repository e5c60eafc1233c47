//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health        → reporter.rs liveness  → {status, service}
//! GET /health/ready  → reporter.rs readiness → {status, service, timestamp, routes}
//! ```
//!
//! # Design Decisions
//! - Reports gateway health only, independent of upstream reachability
//! - Orchestrators can tell "gateway broken" from "one route degraded"

pub mod reporter;

pub use reporter::{HealthReporter, HealthState, HealthStatus, Readiness};
