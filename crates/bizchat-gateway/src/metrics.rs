// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus recorder installation and metric descriptions.
//!
//! Recording happens through the `metrics` facade at the call sites; this
//! module only installs the exporter and describes what gets recorded.

use std::sync::Arc;

use bizchat_core::BizchatError;
use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the global Prometheus recorder and return a render function for
/// `GET /metrics`.
///
/// Only one recorder can be installed per process; a second call fails.
pub fn install_prometheus() -> Result<Arc<dyn Fn() -> String + Send + Sync>, BizchatError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        BizchatError::Internal(format!("failed to install Prometheus recorder: {e}"))
    })?;
    register_metrics();
    tracing::info!("prometheus metrics recorder installed");
    Ok(Arc::new(move || handle.render()))
}

/// Register all Bizchat metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "bizchat_webhooks_received_total",
        "Webhook requests received, by endpoint"
    );
    describe_counter!(
        "bizchat_messages_processed_total",
        "Inbound messages handled, by channel and route"
    );
    describe_counter!(
        "bizchat_outbound_sent_total",
        "Outbound sends, by channel and outcome"
    );
    describe_counter!(
        "bizchat_payments_total",
        "Payments processed, by region, method and outcome"
    );
}

/// Count one webhook delivery.
pub(crate) fn record_webhook(endpoint: &'static str) {
    metrics::counter!("bizchat_webhooks_received_total", "endpoint" => endpoint).increment(1);
}
