//! Route matching logic.
//!
//! # Responsibilities
//! - Normalize configured prefixes
//! - Match path prefixes on segment boundaries
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api/resume` matches `/api/resume` and `/api/resume/...`, never `/api/resumes`
//! - `/` matches every path
//! - No regex to guarantee O(n) matching

use crate::config::ConfigError;

/// Matches the request path against a normalized prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    ///
    /// The prefix must be non-empty and start with `/`. A trailing `/` is
    /// dropped unless the prefix is the root.
    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        let trimmed = prefix.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if !trimmed.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(trimmed.to_string()));
        }

        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        Ok(Self {
            prefix: normalized.to_string(),
        })
    }

    /// The normalized prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` equals the prefix or continues it with `/`.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
