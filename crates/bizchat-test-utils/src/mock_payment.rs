// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock payment adapter with a scripted outcome.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use bizchat_core::payment::{PaymentMethod, PaymentRequest, PaymentResult, TransactionStatus};
use bizchat_core::types::{AdapterType, HealthStatus};
use bizchat_core::{BizchatError, PaymentAdapter, PluginAdapter};

/// A payment adapter that records requests and answers with a fixed status.
pub struct MockPaymentAdapter {
    method: PaymentMethod,
    status: TransactionStatus,
    redirect_url: Option<String>,
    failing: AtomicBool,
    refuse_reversals: AtomicBool,
    requests: Mutex<Vec<PaymentRequest>>,
    reversals: Mutex<Vec<String>>,
}

impl MockPaymentAdapter {
    /// Answers every payment with `Pending`.
    pub fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            status: TransactionStatus::Pending,
            redirect_url: None,
            failing: AtomicBool::new(false),
            refuse_reversals: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            reversals: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }

    /// Make `process_payment` return a payment error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `reverse_transaction` answer `false`.
    pub fn set_refuse_reversals(&self, refuse: bool) {
        self.refuse_reversals.store(refuse, Ordering::SeqCst);
    }

    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn reversals(&self) -> Vec<String> {
        self.reversals.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockPaymentAdapter {
    fn name(&self) -> &str {
        "mock-payment"
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
impl PaymentAdapter for MockPaymentAdapter {
    fn method(&self) -> PaymentMethod {
        self.method
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResult, BizchatError> {
        self.requests.lock().await.push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(BizchatError::payment("mock provider declined"));
        }
        Ok(PaymentResult {
            transaction_id: request.transaction_id.clone(),
            status: self.status,
            provider_reference: Some(format!("mock-{}", request.transaction_id)),
            redirect_url: self.redirect_url.clone(),
        })
    }

    async fn reverse_transaction(&self, transaction_id: &str) -> Result<bool, BizchatError> {
        self.reversals.lock().await.push(transaction_id.to_string());
        Ok(!self.refuse_reversals.load(Ordering::SeqCst))
    }
}
