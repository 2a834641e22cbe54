// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use bizchat_agent::MessageDispatcher;
use bizchat_core::BizchatError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::webhooks;

/// Health state for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl HealthState {
    pub fn new(prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render,
        }
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: MessageDispatcher,
    /// Tracks acknowledged webhooks still being processed, so shutdown can
    /// drain them.
    pub tracker: TaskTracker,
    pub health: HealthState,
}

impl GatewayState {
    pub fn new(dispatcher: MessageDispatcher, health: HealthState) -> Self {
        Self {
            dispatcher,
            tracker: TaskTracker::new(),
            health,
        }
    }
}

/// Address the gateway binds to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&bizchat_config::model::ServerConfig> for ServerConfig {
    fn from(config: &bizchat_config::model::ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// All gateway routes over `state`.
///
/// - GET /health, GET /metrics
/// - GET + POST /webhooks/whatsapp
/// - POST /webhooks/twilio, /webhooks/sms, /webhooks/upi
/// - GET /pay/{id}/qr.svg
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/pay/{id}/qr.svg", get(handlers::get_payment_qr));

    let webhook_routes = Router::new()
        .route(
            "/webhooks/whatsapp",
            get(webhooks::verify_whatsapp).post(webhooks::receive_whatsapp),
        )
        .route("/webhooks/twilio", post(webhooks::receive_twilio))
        .route("/webhooks/sms", post(webhooks::receive_sms))
        .route("/webhooks/upi", post(webhooks::receive_payment_callback));

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the gateway until `shutdown` is cancelled.
///
/// In-flight background processing is not awaited here; drain
/// `state.tracker` after this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), BizchatError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BizchatError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| BizchatError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
