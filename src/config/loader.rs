//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding a full bind address. Wins over `PORT`.
pub const BIND_ADDRESS_ENV: &str = "GATEWAY_BIND_ADDRESS";

/// Startup-time configuration failure. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("route prefix must not be empty")]
    EmptyPrefix,

    #[error("route prefix '{0}' must start with '/'")]
    InvalidPrefix(String),

    #[error("route prefix '{0}' is registered more than once")]
    DuplicatePrefix(String),

    #[error("upstream URL '{url}' for prefix '{prefix}' is invalid: {reason}")]
    InvalidUpstreamUrl {
        prefix: String,
        url: String,
        reason: String,
    },

    #[error("failed to build upstream client: {0}")]
    UpstreamClient(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from an optional TOML file plus the
/// process environment.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`], reading environment values through `lookup`.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides. Unset or empty variables keep the
/// configured value.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = lookup(BIND_ADDRESS_ENV) {
        config.listener.bind_address = addr;
    } else if let Some(port) = lookup(PORT_ENV) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port.trim());
    }

    for upstream in &mut config.upstreams {
        let Some(var) = upstream.url_env.as_deref() else {
            continue;
        };
        if let Some(url) = lookup(var) {
            tracing::debug!(upstream = %upstream.name, env = %var, "Upstream URL overridden from environment");
            upstream.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load_config_with(None, env(&[])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.upstreams[0].url, "http://resume-api-service:3001");
        assert_eq!(
            config.upstreams[1].url,
            "https://gcp-health-api-jpawjztt4a-uw.a.run.app"
        );
    }

    #[test]
    fn test_environment_overrides() {
        let config = load_config_with(
            None,
            env(&[
                ("PORT", "8080"),
                ("RESUME_API_URL", "http://127.0.0.1:4001"),
                ("GCP_HEALTH_API_URL", ""),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstreams[0].url, "http://127.0.0.1:4001");
        // Empty values fall back to the default.
        assert_eq!(
            config.upstreams[1].url,
            "https://gcp-health-api-jpawjztt4a-uw.a.run.app"
        );
    }

    #[test]
    fn test_bind_address_wins_over_port() {
        let config = load_config_with(
            None,
            env(&[("PORT", "8080"), ("GATEWAY_BIND_ADDRESS", "127.0.0.1:9000")]),
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_port_fails_validation() {
        let err = load_config_with(None, env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            service_name = "edge"

            [[upstreams]]
            name = "blog"
            prefix = "/api/blog"
            url = "http://blog-api:3002"
            url_env = "BLOG_API_URL"
            "#
        )
        .unwrap();

        let config =
            load_config_with(Some(file.path()), env(&[("BLOG_API_URL", "http://10.0.0.2")])).unwrap();
        assert_eq!(config.service_name, "edge");
        assert_eq!(config.upstreams.len(), 1);
        assert_eq!(config.upstreams[0].url, "http://10.0.0.2");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_with(Some(Path::new("/nonexistent/gateway.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "upstreams = 5").unwrap();
        let err = load_config_with(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
