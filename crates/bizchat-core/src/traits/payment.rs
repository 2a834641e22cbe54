// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment adapter trait for payment providers (UPI, Stripe, PayPal).

use async_trait::async_trait;

use crate::error::BizchatError;
use crate::payment::{PaymentMethod, PaymentRequest, PaymentResult};
use crate::traits::adapter::PluginAdapter;

#[async_trait]
pub trait PaymentAdapter: PluginAdapter {
    /// The payment method this adapter serves.
    fn method(&self) -> PaymentMethod;

    async fn process_payment(&self, request: &PaymentRequest)
    -> Result<PaymentResult, BizchatError>;

    /// Refund or void a transaction. Returns whether the provider accepted it.
    async fn reverse_transaction(&self, transaction_id: &str) -> Result<bool, BizchatError>;
}
