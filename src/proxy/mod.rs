//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route + rewritten path + inbound request
//!     → ProxiedRequest (method, path, headers, buffered body)
//!     → headers.rs (hop-by-hop stripping, Host rewrite, X-Forwarded-*)
//!     → forwarder.rs (pooled clients, bounded timeouts)
//!     → ProxiedResponse (status, headers, streaming body)
//!     → on failure: error.rs classifies the transport error
//! ```
//!
//! # Design Decisions
//! - The forwarder is a trait object injected into the router
//! - No retries: a forwarded request is sent at most once
//! - Response bodies are streamed, never buffered

pub mod error;
pub mod forwarder;
pub mod headers;

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use futures_util::StreamExt;

use crate::error::GatewayError;
use crate::http::request::request_id;
use crate::routing::Route;

pub use error::{UpstreamError, UpstreamErrorKind};
pub use forwarder::HttpForwarder;

/// An inbound request prepared for forwarding.
#[derive(Debug)]
pub struct ProxiedRequest {
    pub method: Method,
    /// The original request URI, before rewriting.
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl ProxiedRequest {
    /// Collect an axum request, reading at most `max_body_bytes` of body.
    pub async fn from_request(
        request: axum::extract::Request,
        max_body_bytes: usize,
    ) -> Result<Self, GatewayError> {
        let client_addr = request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        let (parts, body) = request.into_parts();

        let mut stream = body.into_data_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GatewayError::BadRequest(e.to_string()))?;
            if buf.len() + chunk.len() > max_body_bytes {
                return Err(GatewayError::PayloadTooLarge {
                    limit: max_body_bytes,
                });
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: Bytes::from(buf),
            client_addr,
        })
    }

    /// Path plus query string, as received.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn request_id(&self) -> &str {
        request_id(&self.headers)
    }
}

/// An upstream response on its way back to the caller.
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Sends a request to the upstream of a matched route.
///
/// `outbound_path` is the already rewritten path and query; implementations
/// send it as the request target without re-normalizing it.
pub trait Forwarder: Send + Sync {
    fn forward<'a>(
        &'a self,
        route: &'a Route,
        outbound_path: String,
        request: ProxiedRequest,
    ) -> BoxFuture<'a, Result<ProxiedResponse, UpstreamError>>;
}
