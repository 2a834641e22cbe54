// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PayPal through the hosted payment page.
//!
//! The customer completes checkout on the page behind the payment link, so
//! processing only registers the pending transaction.

use async_trait::async_trait;
use bizchat_core::payment::{PaymentMethod, PaymentRequest, PaymentResult, TransactionStatus};
use bizchat_core::types::{AdapterType, HealthStatus};
use bizchat_core::{BizchatError, PaymentAdapter, PluginAdapter};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct PayPalAdapter;

impl PayPalAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for PayPalAdapter {
    fn name(&self) -> &str {
        "paypal"
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
impl PaymentAdapter for PayPalAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Paypal
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResult, BizchatError> {
        debug!(transaction_id = %request.transaction_id, "PayPal checkout pending on hosted page");
        Ok(PaymentResult {
            transaction_id: request.transaction_id.clone(),
            status: TransactionStatus::Pending,
            provider_reference: None,
            redirect_url: None,
        })
    }

    async fn reverse_transaction(&self, transaction_id: &str) -> Result<bool, BizchatError> {
        warn!(transaction_id, "PayPal refunds must be issued from the PayPal dashboard");
        Ok(false)
    }
}
