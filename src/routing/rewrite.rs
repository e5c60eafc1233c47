//! Path rewriting between the public surface and an upstream.
//!
//! The rewritten path is joined onto the upstream base URL's own path, so an
//! upstream configured as `http://svc:3001/v1` receives `/v1/...`.
//! An empty result always becomes `/`. Query string and fragment are carried
//! over untouched.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::routing::registry::Route;

/// How the matched prefix is transformed before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewriteRule {
    /// Forward the path unchanged.
    #[default]
    PassThrough,
    /// Remove the route prefix, forwarding only the suffix.
    StripPrefix,
    /// Replace the route prefix with a fixed path.
    ReplacePrefix { with: String },
}

/// Compute the outbound path-and-query for `inbound` on `route`.
pub fn rewrite(route: &Route, inbound: &str) -> String {
    let split = inbound
        .find(|c| c == '?' || c == '#')
        .unwrap_or(inbound.len());
    let (path, tail) = inbound.split_at(split);

    let stripped = path.strip_prefix(route.prefix()).unwrap_or(path);
    let rewritten: Cow<'_, str> = match route.rewrite() {
        RewriteRule::PassThrough => Cow::Borrowed(path),
        RewriteRule::StripPrefix => Cow::Borrowed(stripped),
        RewriteRule::ReplacePrefix { with } => {
            Cow::Owned(format!("{}{}", with.trim_end_matches('/'), stripped))
        }
    };

    let base = route.upstream().path().trim_end_matches('/');

    let mut outbound = String::with_capacity(base.len() + rewritten.len() + tail.len() + 1);
    outbound.push_str(base);
    if !rewritten.is_empty() && !rewritten.starts_with('/') {
        outbound.push('/');
    }
    outbound.push_str(&rewritten);
    if outbound.is_empty() {
        outbound.push('/');
    }
    outbound.push_str(tail);
    outbound
}
