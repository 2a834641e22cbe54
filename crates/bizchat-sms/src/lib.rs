// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS and Twilio channel adapters for the Bizchat message router.
//!
//! - [`twilio::TwilioChannel`] sends WhatsApp and SMS through one Twilio account.
//! - [`msg91::Msg91Channel`] sends SMS through MSG91 flows.
//! - [`sns`] normalizes AWS SNS two-way SMS deliveries.
//!
//! Whichever provider is configured for sending, the shared SMS webhook may
//! receive any of the three inbound shapes, so every adapter here normalizes
//! them all through [`normalize_payload`].

pub mod msg91;
pub mod signature;
pub mod sns;
pub mod twilio;

use std::collections::BTreeMap;
use std::sync::Arc;

use bizchat_core::template::render_template;
use bizchat_core::types::{ChannelType, StandardizedMessage};
use bizchat_core::{BizchatError, StorageAdapter, WebhookPayload};

pub use msg91::Msg91Channel;
pub use twilio::TwilioChannel;

/// Normalize any Twilio, MSG91 or SNS webhook.
pub fn normalize_payload(
    payload: &WebhookPayload,
) -> Result<Vec<StandardizedMessage>, BizchatError> {
    match payload {
        WebhookPayload::Twilio(p) => twilio::normalize(p).map(|m| vec![m]),
        WebhookPayload::Sms(p) => msg91::normalize(p).map(|m| vec![m]),
        WebhookPayload::Sns(envelope) => sns::normalize(envelope),
        WebhookPayload::WhatsApp(_) => Err(BizchatError::InvalidPayload(
            "WhatsApp Cloud payloads are not handled by SMS adapters".into(),
        )),
    }
}

/// Render a stored template for `channel`. The error is the customer-safe
/// failure text for [`bizchat_core::SendResult::Failed`].
pub(crate) async fn render_stored_template(
    store: Option<&Arc<dyn StorageAdapter>>,
    name: &str,
    channel: ChannelType,
    params: &BTreeMap<String, String>,
) -> Result<String, String> {
    let Some(store) = store else {
        return Err(format!("template not found: {name}"));
    };
    match store.get_template(name, channel).await {
        Ok(Some(content)) => Ok(render_template(&content, params)),
        Ok(None) => Err(format!("template not found: {name}")),
        Err(e) => Err(format!("template lookup failed for {name}: {e}")),
    }
}
