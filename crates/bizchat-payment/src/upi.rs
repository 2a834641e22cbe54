// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UPI collect-by-QR payments.
//!
//! The customer scans a `upi://pay` URI with any UPI app; the bank's
//! callback later reports the outcome. Nothing is charged from here, so the
//! adapter only validates the request and leaves the transaction pending.

use std::fmt::Write as _;

use async_trait::async_trait;
use bizchat_core::payment::{
    Money, PaymentMethod, PaymentRequest, PaymentResult, TransactionStatus,
};
use bizchat_core::types::{AdapterType, HealthStatus};
use bizchat_core::{BizchatError, PaymentAdapter, PluginAdapter};
use qrcode::{Color, QrCode};
use tracing::{debug, info};

/// Modules of blank border required around a QR code.
const QUIET_ZONE: usize = 4;

/// Pixels per module in the rendered SVG.
const MODULE_PX: usize = 8;

/// Everything encoded into a UPI payment URI.
#[derive(Debug, Clone, PartialEq)]
pub struct UpiIntent<'a> {
    /// Payee virtual payment address (`shop@okbank`).
    pub payee: &'a str,
    pub payee_name: &'a str,
    pub amount: &'a Money,
    pub note: &'a str,
    /// Transaction reference echoed back in the callback.
    pub reference: &'a str,
}

/// Build the `upi://pay` URI. Query values are percent-encoded.
pub fn upi_uri(intent: &UpiIntent<'_>) -> Result<String, BizchatError> {
    let amount = intent.amount.decimal_string();
    let url = reqwest::Url::parse_with_params(
        "upi://pay",
        &[
            ("pa", intent.payee),
            ("pn", intent.payee_name),
            ("am", amount.as_str()),
            ("cu", intent.amount.currency.as_str()),
            ("tn", intent.note),
            ("tr", intent.reference),
        ],
    )
    .map_err(|e| BizchatError::payment(format!("failed to build UPI URI: {e}")))?;
    Ok(url.to_string())
}

/// Render `data` as a standalone SVG QR code.
pub fn render_qr_svg(data: &str) -> Result<String, BizchatError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| BizchatError::Payment {
        message: format!("failed to encode QR code: {e}"),
        source: Some(Box::new(e)),
    })?;
    let width = code.width();
    let colors = code.to_colors();
    let size = width + 2 * QUIET_ZONE;
    let px = size * MODULE_PX;

    let mut path = String::new();
    for (idx, color) in colors.iter().enumerate() {
        if *color == Color::Dark {
            let x = idx % width + QUIET_ZONE;
            let y = idx / width + QUIET_ZONE;
            let _ = write!(path, "M{x} {y}h1v1h-1z");
        }
    }

    Ok(format!(
        concat!(
            r#"<?xml version="1.0" standalone="yes"?>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{px}" height="{px}" viewBox="0 0 {size} {size}" shape-rendering="crispEdges">"#,
            r##"<rect width="{size}" height="{size}" fill="#ffffff"/>"##,
            r##"<path d="{path}" fill="#000000"/>"##,
            "</svg>"
        ),
        px = px,
        size = size,
        path = path
    ))
}

#[derive(Debug, Default)]
pub struct UpiAdapter;

impl UpiAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for UpiAdapter {
    fn name(&self) -> &str {
        "upi"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentAdapter for UpiAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Upi
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResult, BizchatError> {
        if request.amount.minor <= 0 {
            return Err(BizchatError::payment(format!(
                "UPI amount must be positive, got {}",
                request.amount
            )));
        }
        if request.amount.currency != "INR" {
            return Err(BizchatError::payment(format!(
                "UPI only settles INR, got {}",
                request.amount.currency
            )));
        }
        debug!(transaction_id = %request.transaction_id, amount = %request.amount, "UPI collect request registered");
        Ok(PaymentResult {
            transaction_id: request.transaction_id.clone(),
            status: TransactionStatus::Pending,
            provider_reference: None,
            redirect_url: None,
        })
    }

    /// UPI has no programmatic refund here; the merchant refunds from their
    /// bank app and the transaction is marked refunded.
    async fn reverse_transaction(&self, transaction_id: &str) -> Result<bool, BizchatError> {
        info!(transaction_id, "UPI refund recorded; settle it from the merchant bank app");
        Ok(true)
    }
}
