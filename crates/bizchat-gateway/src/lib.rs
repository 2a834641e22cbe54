// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook gateway for the Bizchat message router.
//!
//! Exposes one endpoint per inbound provider plus the payment callback,
//! the UPI QR image, health and Prometheus metrics. Message webhooks are
//! authenticated and parsed synchronously, acknowledged, and then handed
//! to the dispatcher on a tracked background task.

pub mod handlers;
pub mod metrics;
pub mod server;
pub mod webhooks;

pub use metrics::install_prometheus;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
