//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Look up the matching route for a request path
//! - Refuse paths with `.` or `..` segments
//! - Rewrite the path and hand the request to the injected forwarder
//! - Log upstream failures with their raw cause
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routing happens before the body is read, so unknown paths cost nothing
//! - Explicit NotFound rather than silent default

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::proxy::{Forwarder, ProxiedRequest};
use crate::routing::registry::{Route, UpstreamRegistry};
use crate::routing::rewrite::rewrite;

/// Dispatches requests to upstreams.
pub struct Router {
    registry: Arc<UpstreamRegistry>,
    forwarder: Arc<dyn Forwarder>,
    max_body_bytes: usize,
}

impl Router {
    pub fn new(
        registry: Arc<UpstreamRegistry>,
        forwarder: Arc<dyn Forwarder>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            registry,
            forwarder,
            max_body_bytes,
        }
    }

    pub fn registry(&self) -> &UpstreamRegistry {
        &self.registry
    }

    /// Longest-prefix route for `path`.
    ///
    /// Paths containing dot segments never match, so a request cannot climb
    /// out of the subtree its prefix maps to.
    pub fn route(&self, path: &str) -> Result<Arc<Route>, GatewayError> {
        let not_found = || GatewayError::NotFound {
            path: path.to_string(),
        };
        if has_dot_segment(path) {
            return Err(not_found());
        }
        self.registry.resolve(path).ok_or_else(not_found)
    }

    /// Route, collect and forward an inbound request.
    pub async fn dispatch(&self, request: Request) -> Result<Response, GatewayError> {
        let route = match self.route(request.uri().path()) {
            Ok(route) => route,
            Err(err) => {
                tracing::debug!(method = %request.method(), path = %request.uri().path(), "No route matched");
                return Err(err);
            }
        };
        let request = ProxiedRequest::from_request(request, self.max_body_bytes).await?;
        self.forward(&route, request).await
    }

    /// Forward an already collected request on `route`.
    pub async fn forward(
        &self,
        route: &Route,
        request: ProxiedRequest,
    ) -> Result<Response, GatewayError> {
        let start = Instant::now();
        let request_id = request.request_id().to_string();
        let method = request.method.clone();
        let path = request.path_and_query().to_string();
        let outbound_path = rewrite(route, &path);

        match self.forwarder.forward(route, outbound_path, request).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    upstream = %route.name(),
                    status = %response.status,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                Ok(response.into_response())
            }
            Err(source) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    upstream = %route.name(),
                    kind = %source.kind(),
                    error = %source,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream error"
                );
                Err(GatewayError::Upstream {
                    label: route.label().to_string(),
                    source,
                })
            }
        }
    }
}

/// Whether any segment of `path` is `.` or `..`, literal or percent-encoded.
///
/// Backslashes count as separators because URL parsers treat them as `/`
/// for http(s).
fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProxiedResponse, UpstreamError, UpstreamErrorKind};
    use crate::routing::RewriteRule;
    use axum::body::Body;
    use axum::http::{HeaderMap, StatusCode};
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;

    /// Records what it was asked to forward and replies with a fixed outcome.
    struct FakeForwarder {
        fail: Option<UpstreamErrorKind>,
        seen: Mutex<Vec<(String, String, Vec<u8>)>>,
    }

    impl FakeForwarder {
        fn new(fail: Option<UpstreamErrorKind>) -> Arc<Self> {
            Arc::new(Self {
                fail,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Forwarder for FakeForwarder {
        fn forward<'a>(
            &'a self,
            route: &'a Route,
            outbound_path: String,
            request: ProxiedRequest,
        ) -> BoxFuture<'a, Result<ProxiedResponse, UpstreamError>> {
            Box::pin(async move {
                self.seen.lock().unwrap().push((
                    route.name().to_string(),
                    outbound_path,
                    request.body.to_vec(),
                ));
                match self.fail {
                    Some(kind) => Err(UpstreamError::new(kind, "injected")),
                    None => Ok(ProxiedResponse {
                        status: StatusCode::OK,
                        headers: HeaderMap::new(),
                        body: Body::from("ok"),
                    }),
                }
            })
        }
    }

    fn router(forwarder: Arc<FakeForwarder>, max_body_bytes: usize) -> Router {
        let mut builder = UpstreamRegistry::builder();
        builder
            .register(
                Route::new(
                    "resume",
                    "Resume",
                    "/api/resume",
                    "http://resume-api-service:3001",
                    RewriteRule::ReplacePrefix { with: "/resume".into() },
                )
                .unwrap(),
            )
            .unwrap();
        Router::new(Arc::new(builder.build()), forwarder, max_body_bytes)
    }

    fn request(uri: &str, body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_rewrites_and_forwards_body() {
        let fake = FakeForwarder::new(None);
        let router = router(fake.clone(), 1024);

        let response = router
            .dispatch(request("/api/resume?lang=en", "{\"a\":1}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "resume");
        assert_eq!(seen[0].1, "/resume?lang=en");
        assert_eq!(seen[0].2, b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_unknown_path_not_forwarded() {
        let fake = FakeForwarder::new(None);
        let router = router(fake.clone(), 1024);

        let err = router.dispatch(request("/api/unknown", "")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { ref path } if path == "/api/unknown"));
        assert!(fake.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dot_segments_not_forwarded() {
        let fake = FakeForwarder::new(None);
        let router = router(fake.clone(), 1024);

        for path in [
            "/api/resume/../../admin",
            "/api/resume/./secret",
            "/api/resume/%2e%2e/secret",
            "/api/resume/.%2E/secret",
            "/api/resume/%2E%2e",
            "/api/resume/..\\admin",
        ] {
            let err = router.dispatch(request(path, "")).await.unwrap_err();
            assert!(matches!(err, GatewayError::NotFound { .. }), "{} was routed", path);
        }
        assert!(fake.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dot_like_names_are_ordinary_segments() {
        assert!(!has_dot_segment("/api/resume/.well-known/x"));
        assert!(!has_dot_segment("/api/resume/v1..2"));
        assert!(!has_dot_segment("/api/resume/..."));
        assert!(has_dot_segment("/api/resume/.."));
    }

    #[tokio::test]
    async fn test_upstream_failure_carries_label() {
        let router = router(FakeForwarder::new(Some(UpstreamErrorKind::Timeout)), 1024);

        let err = router.dispatch(request("/api/resume", "")).await.unwrap_err();
        match err {
            GatewayError::Upstream { label, source } => {
                assert_eq!(label, "Resume");
                assert_eq!(source.kind(), UpstreamErrorKind::Timeout);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_body_limit() {
        let fake = FakeForwarder::new(None);
        let router = router(fake.clone(), 4);

        let err = router
            .dispatch(request("/api/resume", "too large"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::PayloadTooLarge { limit: 4 }));
        assert!(fake.seen.lock().unwrap().is_empty());
    }
}
