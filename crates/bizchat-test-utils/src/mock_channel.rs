// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `MessageChannel`, capturing every outbound
//! message for assertions. Inbound payloads are normalized with the real
//! provider parsers so webhook tests exercise production code.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use bizchat_core::types::{
    AdapterType, ChannelType, HealthStatus, OutboundMedia, SendResult, StandardizedMessage,
};
use bizchat_core::{BizchatError, MessageChannel, PluginAdapter, WebhookPayload};
use bizchat_whatsapp::inbound::MediaBase;

/// What was handed to the mock for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentBody {
    Text(String),
    Media(OutboundMedia),
    Template {
        name: String,
        params: BTreeMap<String, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: SentBody,
}

impl SentMessage {
    /// Text body, or the media caption.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            SentBody::Text(text) => Some(text),
            SentBody::Media(media) => media.caption(),
            SentBody::Template { .. } => None,
        }
    }
}

/// A mock messaging channel for testing.
pub struct MockChannel {
    channel_type: ChannelType,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    read: Arc<Mutex<Vec<String>>>,
    failing: AtomicBool,
    initialized: AtomicBool,
}

impl MockChannel {
    pub fn new(channel_type: ChannelType) -> Self {
        Self {
            channel_type,
            sent: Arc::new(Mutex::new(Vec::new())),
            read: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    /// Make every subsequent send fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Text bodies and media captions, in send order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|m| m.text().map(str::to_string))
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    /// Message ids passed to `mark_read`.
    pub async fn marked_read(&self) -> Vec<String> {
        self.read.lock().await.clone()
    }

    async fn record(&self, to: &str, body: SentBody) -> SendResult {
        if self.failing.load(Ordering::SeqCst) {
            return SendResult::failed("mock channel configured to fail");
        }
        self.sent.lock().await.push(SentMessage {
            to: to.to_string(),
            body,
        });
        SendResult::sent(format!("mock-msg-{}", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Degraded("sends are failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for MockChannel {
    fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    async fn initialize(&self) -> bool {
        self.initialized.store(true, Ordering::SeqCst);
        true
    }

    async fn send_text(&self, to: &str, text: &str) -> SendResult {
        self.record(to, SentBody::Text(text.to_string())).await
    }

    async fn send_template(
        &self,
        to: &str,
        template: &str,
        params: &BTreeMap<String, String>,
    ) -> SendResult {
        self.record(
            to,
            SentBody::Template {
                name: template.to_string(),
                params: params.clone(),
            },
        )
        .await
    }

    async fn send_media(&self, to: &str, media: &OutboundMedia) -> SendResult {
        self.record(to, SentBody::Media(media.clone())).await
    }

    async fn mark_read(&self, message_id: &str) {
        self.read.lock().await.push(message_id.to_string());
    }

    fn process_incoming(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Vec<StandardizedMessage>, BizchatError> {
        match payload {
            WebhookPayload::WhatsApp(p) => bizchat_whatsapp::inbound::normalize(
                p,
                &MediaBase {
                    api_base: "https://graph.facebook.com".into(),
                    api_version: "v17.0".into(),
                },
            ),
            other => bizchat_sms::normalize_payload(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new(ChannelType::Sms);
        let result = channel.send_text("+919876543210", "hello").await;
        assert!(result.is_success());
        assert!(result.message_id().unwrap().starts_with("mock-msg-"));
        assert_eq!(channel.sent_texts().await, vec!["hello"]);
        assert_eq!(channel.sent_messages().await[0].to, "+919876543210");
    }

    #[tokio::test]
    async fn failing_channel_reports_failure() {
        let channel = MockChannel::new(ChannelType::WhatsApp);
        channel.set_failing(true);
        let result = channel.send_text("+919876543210", "hello").await;
        assert!(!result.is_success());
        assert_eq!(channel.sent_count().await, 0);
        assert!(matches!(
            channel.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn incoming_payloads_use_real_parsers() {
        let channel = MockChannel::new(ChannelType::Sms);
        let payload =
            WebhookPayload::twilio_from_form(b"From=%2B14155550100&Body=pay&MessageSid=SM1")
                .unwrap();
        let messages = channel.process_incoming(&payload).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "+14155550100");
        assert_eq!(messages[0].channel, ChannelType::Sms);
    }
}
