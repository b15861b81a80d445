//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that forwards to the configuration service
//! - Wire up middleware (timeout, request ID, tracing)
//! - Put the access gate in front of all of it
//! - Serve with peer addresses attached and shut down gracefully

use std::net::SocketAddr;
use std::time::Duration;

use axum::{body::Body, http::Request, routing::any, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GateConfig;
use crate::http::middleware::gate_router;
use crate::http::upstream::{forward_handler, Upstream, UpstreamError};
use crate::security::AccessGate;

/// Error type for server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Failed to serve: {0}")]
    Serve(#[from] std::io::Error),
}

/// HTTP server fronting the configuration service.
pub struct GateServer {
    router: Router,
    config: GateConfig,
    gate: AccessGate,
}

impl GateServer {
    /// Create a new server from a validated configuration.
    pub fn new(config: GateConfig) -> Result<Self, ServerError> {
        let gate = AccessGate::from_config(&config.app);
        let upstream = Upstream::new(
            &config.upstream,
            Duration::from_secs(config.timeouts.upstream_secs),
        )?;

        tracing::info!(
            allowed_origins = gate.allowed_origins().len(),
            localhost_ipv4 = %gate.localhost().ipv4(),
            localhost_ipv6 = %gate.localhost().ipv6(),
            upstream = %upstream.authority(),
            "Access gate configured"
        );

        let router = Self::build_router(&config, gate.clone(), upstream);
        Ok(Self {
            router,
            config,
            gate,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last-added, so the gate is added last and sees
    /// every request before tracing, request IDs, timeouts or routing.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, gate: AccessGate, upstream: Upstream) -> Router {
        let inner = Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(upstream)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        gate_router(inner, gate)
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
