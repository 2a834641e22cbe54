// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging providers (WhatsApp Cloud, Twilio, MSG91).

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::BizchatError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelType, OutboundMedia, SendResult, StandardizedMessage};
use crate::webhook::WebhookPayload;

/// Adapter for one messaging provider.
///
/// The dispatcher and the outbound sender only ever see this trait. Sends
/// report provider failures through [`SendResult`] rather than `Err`.
#[async_trait]
pub trait MessageChannel: PluginAdapter {
    /// The channel this adapter delivers on.
    fn channel_type(&self) -> ChannelType;

    /// Validate credentials. Idempotent; callers invoke it lazily before the
    /// first send.
    async fn initialize(&self) -> bool;

    async fn send_text(&self, to: &str, text: &str) -> SendResult;

    /// Render a named template with `{{key}}` parameters and send it.
    async fn send_template(
        &self,
        to: &str,
        template: &str,
        params: &BTreeMap<String, String>,
    ) -> SendResult;

    /// Send an image or document. Channels without media support fail.
    async fn send_media(&self, to: &str, media: &OutboundMedia) -> SendResult {
        let _ = (to, media);
        SendResult::failed(format!("{} does not support media", self.name()))
    }

    /// Tell the provider an inbound message was processed. Channels
    /// without read receipts ignore it.
    async fn mark_read(&self, message_id: &str) {
        let _ = message_id;
    }

    /// Normalize a provider webhook into standardized messages.
    ///
    /// Payloads for other providers or with missing required fields yield
    /// `BizchatError::InvalidPayload`. A valid notification that carries no
    /// customer messages (delivery receipts) yields an empty vector.
    fn process_incoming(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Vec<StandardizedMessage>, BizchatError>;
}
