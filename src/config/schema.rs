//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::RewriteRule;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Name reported by the health endpoints.
    pub service_name: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream definitions, one per public prefix.
    pub upstreams: Vec<UpstreamConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Size and pool limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            service_name: "api-gateway".to_string(),
            listener: ListenerConfig::default(),
            upstreams: default_upstreams(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// A single upstream service reachable under a public path prefix.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream identifier for logging.
    pub name: String,

    /// Human-readable service name used in failure messages.
    #[serde(default)]
    pub label: Option<String>,

    /// Public path prefix routed to this upstream (e.g., "/api/resume").
    pub prefix: String,

    /// Upstream base URL (e.g., "http://resume-api-service:3001").
    pub url: String,

    /// Environment variable that overrides `url` when set.
    #[serde(default)]
    pub url_env: Option<String>,

    /// Path rewrite applied before forwarding.
    #[serde(default)]
    pub rewrite: RewriteRule,
}

impl UpstreamConfig {
    /// Label used in client-facing error messages, falling back to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

fn default_upstreams() -> Vec<UpstreamConfig> {
    vec![
        UpstreamConfig {
            name: "resume".to_string(),
            label: Some("Resume".to_string()),
            prefix: "/api/resume".to_string(),
            url: "http://resume-api-service:3001".to_string(),
            url_env: Some("RESUME_API_URL".to_string()),
            rewrite: RewriteRule::ReplacePrefix {
                with: "/resume".to_string(),
            },
        },
        UpstreamConfig {
            name: "gcp-health".to_string(),
            label: Some("GCP Health".to_string()),
            prefix: "/api/gcp-health".to_string(),
            url: "https://gcp-health-api-jpawjztt4a-uw.a.run.app".to_string(),
            url_env: Some("GCP_HEALTH_API_URL".to_string()),
            rewrite: RewriteRule::StripPrefix,
        },
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Time allowed until upstream response headers arrive, in milliseconds.
    pub request_ms: u64,

    /// Maximum idle gap between upstream body chunks, in milliseconds.
    pub read_ms: u64,

    /// Upper bound on a whole upstream call, body included, in milliseconds.
    pub total_ms: u64,

    /// Idle pooled connection lifetime in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 2_000,
            request_ms: 10_000,
            read_ms: 30_000,
            total_ms: 120_000,
            pool_idle_secs: 90,
        }
    }
}

/// Size and connection pool limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,

    /// Maximum idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            pool_max_idle_per_host: 32,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
