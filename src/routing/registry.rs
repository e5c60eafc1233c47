//! Upstream registry.
//!
//! # Responsibilities
//! - Validate and store routes (prefix → upstream + rewrite rule)
//! - Reject empty, malformed or duplicate prefixes at registration
//! - Resolve a path to the route with the longest matching prefix
//!
//! # Design Decisions
//! - Registration only exists on `RegistryBuilder`; `build()` freezes it
//! - Routes kept sorted by prefix length (longest first), so the first
//!   match is the longest match
//! - Immutable after construction (thread-safe without locks)

use std::collections::HashSet;
use std::sync::Arc;

use url::Url;

use crate::config::{ConfigError, UpstreamConfig};
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::rewrite::RewriteRule;

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    label: String,
    matcher: PathPrefixMatcher,
    upstream: Url,
    rewrite: RewriteRule,
}

impl Route {
    /// Build a route, validating the prefix and upstream URL.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        prefix: &str,
        upstream: &str,
        rewrite: RewriteRule,
    ) -> Result<Self, ConfigError> {
        let matcher = PathPrefixMatcher::new(prefix)?;
        let upstream = parse_upstream(matcher.prefix(), upstream)?;

        Ok(Self {
            name: name.into(),
            label: label.into(),
            matcher,
            upstream,
            rewrite,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable service name used in failure messages.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    pub fn rewrite(&self) -> &RewriteRule {
        &self.rewrite
    }

    /// Whether this route serves `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// `scheme://authority` of the upstream, without path.
    pub fn origin(&self) -> &str {
        &self.upstream[..url::Position::BeforePath]
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> String {
        let host = self.upstream.host_str().unwrap_or_default();
        match self.upstream.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

fn parse_upstream(prefix: &str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUpstreamUrl {
        prefix: prefix.to_string(),
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Collects routes at startup. Consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    routes: Vec<Route>,
    prefixes: HashSet<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, rejecting duplicate prefixes.
    pub fn register(&mut self, route: Route) -> Result<&mut Self, ConfigError> {
        if !self.prefixes.insert(route.prefix().to_string()) {
            return Err(ConfigError::DuplicatePrefix(route.prefix().to_string()));
        }
        self.routes.push(route);
        Ok(self)
    }

    /// Register a route from its configuration entry.
    pub fn register_config(&mut self, config: &UpstreamConfig) -> Result<&mut Self, ConfigError> {
        let route = Route::new(
            config.name.clone(),
            config.label(),
            &config.prefix,
            &config.url,
            config.rewrite.clone(),
        )?;
        self.register(route)
    }

    /// Freeze the registry.
    pub fn build(mut self) -> UpstreamRegistry {
        self.routes
            .sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        UpstreamRegistry {
            routes: self.routes.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Immutable prefix → upstream table.
#[derive(Debug, Default)]
pub struct UpstreamRegistry {
    /// Sorted by prefix length, longest first.
    routes: Vec<Arc<Route>>,
}

impl UpstreamRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from the configured upstreams.
    pub fn from_config(upstreams: &[UpstreamConfig]) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        for upstream in upstreams {
            builder.register_config(upstream)?;
        }
        Ok(builder.build())
    }

    /// Longest-prefix match for `path`.
    pub fn resolve(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.iter().find(|r| r.matches(path)).cloned()
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
