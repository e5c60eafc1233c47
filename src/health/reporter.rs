//! Gateway self-health.
//!
//! # Responsibilities
//! - Answer liveness: the process can run a handler
//! - Answer readiness: the route table is usable
//!
//! # Design Decisions
//! - Never probes upstreams; an unreachable upstream degrades one route,
//!   not the gateway
//! - Status recomputed per query, nothing cached

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Overall gateway state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Degraded,
}

/// A point-in-time health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub service: String,
    /// RFC 3339 timestamp, UTC.
    pub timestamp: String,
}

impl HealthStatus {
    /// The `{status, service}` pair served on `/health`.
    pub fn summary(&self) -> HealthSummary<'_> {
        HealthSummary {
            status: self.status,
            service: &self.service,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthSummary<'a> {
    pub status: HealthState,
    pub service: &'a str,
}

/// Readiness report: health plus route table size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    #[serde(flatten)]
    pub health: HealthStatus,
    pub routes: usize,
}

/// Reports on the gateway process itself.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    service: String,
    routes: usize,
}

impl HealthReporter {
    pub fn new(service: impl Into<String>, routes: usize) -> Self {
        Self {
            service: service.into(),
            routes,
        }
    }

    /// Always `ok` while the process can serve this call.
    pub fn liveness(&self) -> HealthStatus {
        self.status(HealthState::Ok)
    }

    /// `degraded` when no route is registered.
    pub fn readiness(&self) -> Readiness {
        let state = if self.routes == 0 {
            HealthState::Degraded
        } else {
            HealthState::Ok
        };
        Readiness {
            health: self.status(state),
            routes: self.routes,
        }
    }

    fn status(&self, status: HealthState) -> HealthStatus {
        HealthStatus {
            status,
            service: self.service.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
