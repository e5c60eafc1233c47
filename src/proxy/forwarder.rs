//! HTTP forwarder backed by pooled upstream clients.
//!
//! # Responsibilities
//! - Send the already rewritten request target to the route's upstream
//! - Bound connect, response-header, per-chunk and whole-call time
//! - Stream the upstream body back chunk by chunk
//!
//! # Design Decisions
//! - Plain `http` upstreams go through a hyper client with an `http::Uri`
//!   built from the rewritten path, so the target is sent byte for byte
//! - `https` upstreams go through `reqwest` for TLS
//! - One client of each kind per process, built at startup
//! - Redirects are passed through, never followed
//! - Dropping the returned future or the body stream aborts the in-flight
//!   request and closes its connection instead of returning it to the pool

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{uri::Scheme, HeaderMap, Request, StatusCode, Uri};
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tokio::time::Instant;

use crate::config::{ConfigError, LimitsConfig, TimeoutConfig};
use crate::proxy::error::BoxError;
use crate::proxy::headers::{outbound_request_headers, strip_hop_by_hop};
use crate::proxy::{Forwarder, ProxiedRequest, ProxiedResponse, UpstreamError, UpstreamErrorKind};
use crate::routing::Route;

type ChunkStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Upstream answer before hop-by-hop stripping.
struct UpstreamReply {
    status: StatusCode,
    headers: HeaderMap,
    body: ChunkStream,
}

/// Forwards requests over HTTP(S) with shared connection pools.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    plain: Client<HttpConnector, Body>,
    tls: reqwest::Client,
    request_timeout: Duration,
    read_timeout: Duration,
    total_timeout: Duration,
}

impl HttpForwarder {
    /// Build the forwarder and its connection pools.
    pub fn new(timeouts: &TimeoutConfig, limits: &LimitsConfig) -> Result<Self, ConfigError> {
        let connect_timeout = Duration::from_millis(timeouts.connect_ms);
        let pool_idle = Duration::from_secs(timeouts.pool_idle_secs);

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);
        let plain = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(pool_idle)
            .pool_max_idle_per_host(limits.pool_max_idle_per_host)
            .build(connector);

        let tls = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(pool_idle)
            .pool_max_idle_per_host(limits.pool_max_idle_per_host)
            .build()
            .map_err(|e| ConfigError::UpstreamClient(e.to_string()))?;

        Ok(Self {
            plain,
            tls,
            request_timeout: Duration::from_millis(timeouts.request_ms),
            read_timeout: Duration::from_millis(timeouts.read_ms),
            total_timeout: Duration::from_millis(timeouts.total_ms),
        })
    }

    async fn send(
        &self,
        route: &Route,
        outbound_path: String,
        request: ProxiedRequest,
    ) -> Result<ProxiedResponse, UpstreamError> {
        let deadline = Instant::now() + self.total_timeout;
        let headers = outbound_request_headers(&request.headers, route, request.client_addr);
        let target = format!("{}{}", route.origin(), outbound_path);

        tracing::info!(
            request_id = %request.request_id(),
            method = %request.method,
            path = %request.path_and_query(),
            upstream = %route.name(),
            target = %target,
            "Forwarding request"
        );

        let exchange = async {
            if route.upstream().scheme() == "https" {
                self.send_tls(route, &outbound_path, request, headers).await
            } else {
                self.send_plain(route, &outbound_path, request, headers).await
            }
        };

        // Dropping `exchange` on expiry discards the connection.
        let reply = tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| UpstreamError::timeout(self.request_timeout))??;

        let upstream = route.name().to_string();
        let body = bounded_body(reply.body, self.read_timeout, deadline).inspect_err(move |e| {
            tracing::warn!(upstream = %upstream, error = %e, "Upstream body stream aborted");
        });

        Ok(ProxiedResponse {
            status: reply.status,
            headers: strip_hop_by_hop(&reply.headers),
            body: Body::from_stream(body),
        })
    }

    async fn send_plain(
        &self,
        route: &Route,
        outbound_path: &str,
        request: ProxiedRequest,
        headers: HeaderMap,
    ) -> Result<UpstreamReply, UpstreamError> {
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(route.host_header().as_str())
            .path_and_query(outbound_path)
            .build()
            .map_err(|e| UpstreamError::new(UpstreamErrorKind::Protocol, e))?;

        let mut outbound = Request::builder()
            .method(request.method)
            .uri(uri)
            .body(Body::from(request.body))
            .map_err(|e| UpstreamError::new(UpstreamErrorKind::Protocol, e))?;
        *outbound.headers_mut() = headers;

        let (parts, body) = self.plain.request(outbound).await?.into_parts();
        Ok(UpstreamReply {
            status: parts.status,
            headers: parts.headers,
            body: Body::new(body).into_data_stream().map_err(BoxError::from).boxed(),
        })
    }

    async fn send_tls(
        &self,
        route: &Route,
        outbound_path: &str,
        request: ProxiedRequest,
        headers: HeaderMap,
    ) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .tls
            .request(request.method, format!("{}{}", route.origin(), outbound_path))
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        Ok(UpstreamReply {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.bytes_stream().map_err(BoxError::from).boxed(),
        })
    }
}

impl Forwarder for HttpForwarder {
    fn forward<'a>(
        &'a self,
        route: &'a Route,
        outbound_path: String,
        request: ProxiedRequest,
    ) -> BoxFuture<'a, Result<ProxiedResponse, UpstreamError>> {
        Box::pin(self.send(route, outbound_path, request))
    }
}

/// End `body` with a timeout error when a chunk takes longer than `idle`
/// or the stream runs past `deadline`.
fn bounded_body(body: ChunkStream, idle: Duration, deadline: Instant) -> ChunkStream {
    stream::unfold(Some(body), move |state| async move {
        let Some(mut body) = state else {
            return None;
        };

        let now = Instant::now();
        if now >= deadline {
            return Some((Err(UpstreamError::body_timeout("exceeded call deadline").into()), None));
        }

        let wait_until = (now + idle).min(deadline);
        match tokio::time::timeout_at(wait_until, body.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
            Ok(Some(Err(e))) => Some((Err(e), None)),
            Ok(None) => None,
            Err(_) if wait_until == deadline => {
                Some((Err(UpstreamError::body_timeout("exceeded call deadline").into()), None))
            }
            Err(_) => Some((Err(UpstreamError::body_timeout("stalled").into()), None)),
        }
    })
    .boxed()
}
