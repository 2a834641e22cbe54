// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-webhook endpoints: health, metrics and the UPI QR image.

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bizchat_core::{BizchatError, HealthStatus};
use serde::Serialize;
use tracing::warn;

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Channels with a registered adapter.
    pub channels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// GET /health
///
/// 200 while every channel is at least degraded, 503 once any is unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let ctx = state.dispatcher.context();
    let (code, status, detail) = match ctx.channels.health().await {
        HealthStatus::Healthy => (StatusCode::OK, "ok", None),
        HealthStatus::Degraded(reason) => (StatusCode::OK, "degraded", Some(reason)),
        HealthStatus::Unhealthy(reason) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(reason))
        }
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        channels: ctx
            .channels
            .channel_types()
            .iter()
            .map(ToString::to_string)
            .collect(),
        detail,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics are disabled"),
    }
}

/// GET /pay/{id}/qr.svg
pub async fn get_payment_qr(
    State(state): State<GatewayState>,
    Path(transaction_id): Path<String>,
) -> Response {
    match state.dispatcher.context().payments.upi_qr(&transaction_id).await {
        Ok(Some(qr)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/svg+xml"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            qr.svg,
        )
            .into_response(),
        Ok(None) | Err(BizchatError::NotFound { .. }) => {
            error_response(StatusCode::NOT_FOUND, "no UPI payment for this id")
        }
        Err(e) => {
            warn!(transaction_id = %transaction_id, error = %e, "QR generation failed");
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}
