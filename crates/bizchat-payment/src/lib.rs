// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment gateway bridge for Bizchat.
//!
//! Resolves a regional configuration (currency, tax, default method) for
//! each payment, dispatches to the adapter registered for that region and
//! method, and owns the transaction lifecycle from creation through provider
//! callbacks, invoicing and refunds.

pub mod bridge;
pub mod paypal;
pub mod region;
pub mod stripe;
pub mod upi;

use std::sync::Arc;

use bizchat_config::model::BizchatConfig;
use bizchat_core::payment::{PaymentMethod, PaymentRegion};
use bizchat_core::{AuditSink, BizchatError, StorageAdapter};
use tracing::info;

pub use bridge::{CallbackOutcome, PaymentBridge, PaymentCallback, PaymentSession, UpiQr};
pub use paypal::PayPalAdapter;
pub use region::{RegionConfig, resolve_region};
pub use stripe::StripeAdapter;
pub use upi::UpiAdapter;

/// Build the bridge with the standard adapter wiring: UPI for India,
/// PayPal globally, and Stripe cards for India and globally when a Stripe
/// key is configured.
pub fn default_bridge(
    config: &BizchatConfig,
    storage: Arc<dyn StorageAdapter>,
    audit: Arc<dyn AuditSink>,
) -> Result<PaymentBridge, BizchatError> {
    let mut bridge = PaymentBridge::new(
        &config.payment,
        &config.server.effective_public_url(),
        storage,
        audit,
    )
    .register(
        PaymentRegion::India,
        PaymentMethod::Upi,
        Arc::new(UpiAdapter::new()),
    )
    .register(
        PaymentRegion::Global,
        PaymentMethod::Paypal,
        Arc::new(PayPalAdapter::new()),
    );

    if let Some(key) = config
        .payment
        .stripe_secret_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
    {
        let stripe: Arc<StripeAdapter> =
            Arc::new(StripeAdapter::new(&config.payment.stripe_api_base, key)?);
        bridge = bridge
            .register(PaymentRegion::India, PaymentMethod::CreditCard, stripe.clone())
            .register(PaymentRegion::Global, PaymentMethod::CreditCard, stripe);
    } else {
        info!("stripe_secret_key not set, card payments disabled");
    }

    Ok(bridge)
}
