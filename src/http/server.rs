//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Serve gateway health endpoints
//! - Dispatch everything else to the routing engine
//! - Graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::error::GatewayError;
use crate::health::HealthReporter;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::proxy::{Forwarder, HttpForwarder};
use crate::routing::{Router as ProxyRouter, UpstreamRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub health: Arc<HealthReporter>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the route table and upstream client from `config`.
    ///
    /// Fails on any malformed or duplicate route, before anything is bound.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let registry = UpstreamRegistry::from_config(&config.upstreams)?;
        let forwarder = HttpForwarder::new(&config.timeouts, &config.limits)?;
        Ok(Self::with_forwarder(config, registry, Arc::new(forwarder)))
    }

    /// Build a server around an explicit registry and forwarder.
    pub fn with_forwarder(
        config: GatewayConfig,
        registry: UpstreamRegistry,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        for route in registry.routes() {
            tracing::info!(
                prefix = %route.prefix(),
                upstream = %route.upstream(),
                rewrite = ?route.rewrite(),
                "Route registered"
            );
        }

        let health = Arc::new(HealthReporter::new(
            config.service_name.clone(),
            registry.len(),
        ));
        let proxy_router = Arc::new(ProxyRouter::new(
            Arc::new(registry),
            forwarder,
            config.limits.max_body_bytes,
        ));

        let state = AppState {
            router: proxy_router,
            health,
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(liveness_handler).fallback(not_found_handler))
            .route("/health/ready", get(readiness_handler).fallback(not_found_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The configured Axum router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service_name,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                wait_for_shutdown(shutdown).await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn liveness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.health.liveness();
    Json(status.summary()).into_response()
}

async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health.readiness())
}

async fn not_found_handler(request: Request) -> GatewayError {
    GatewayError::NotFound {
        path: request.uri().path().to_string(),
    }
}

/// Everything that is not a health endpoint goes through the route table.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    match state.router.dispatch(request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
