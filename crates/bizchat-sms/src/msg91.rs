// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MSG91 SMS adapter.
//!
//! Sends go through a flow whose `VAR1` variable holds the whole body.
//! MSG91 wants numbers without `+` and rejects bodies over one segment, so
//! outgoing text is truncated to `sms.max_length`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bizchat_config::model::SmsConfig;
use bizchat_core::phone::{canonical_phone, without_plus};
use bizchat_core::time::normalize_timestamp;
use bizchat_core::types::{
    AdapterType, ChannelType, HealthStatus, MessagePayload, SendResult, StandardizedMessage,
};
use bizchat_core::webhook::Msg91Payload;
use bizchat_core::{BizchatError, MessageChannel, PluginAdapter, StorageAdapter, WebhookPayload};
use reqwest::header::HeaderValue;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{normalize_payload, render_stored_template};

pub const PROVIDER: &str = "msg91";

const ELLIPSIS: &str = "...";

#[derive(Debug, Deserialize)]
struct FlowResponse {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate_sms(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn normalize(payload: &Msg91Payload) -> Result<StandardizedMessage, BizchatError> {
    let from = payload
        .msisdn
        .as_deref()
        .map(canonical_phone)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| BizchatError::InvalidPayload("msg91 webhook: missing sender".into()))?;
    let body = payload
        .message
        .clone()
        .ok_or_else(|| BizchatError::InvalidPayload("msg91 webhook: missing message".into()))?;

    Ok(StandardizedMessage {
        id: payload
            .request_id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        from,
        timestamp: normalize_timestamp(payload.received_at.as_deref()),
        channel: ChannelType::Sms,
        payload: MessagePayload::Text { body },
        provider: PROVIDER.to_string(),
        business_number: payload
            .keyword
            .as_deref()
            .map(canonical_phone)
            .filter(|n| !n.is_empty()),
        sender_name: None,
    })
}

pub struct Msg91Channel {
    auth_key: Option<HeaderValue>,
    flow_id: Option<String>,
    sender_id: String,
    flow_url: String,
    max_length: usize,
    client: reqwest::Client,
    templates: Option<Arc<dyn StorageAdapter>>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for Msg91Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Msg91Channel")
            .field("auth_key", &self.auth_key.as_ref().map(|_| "[redacted]"))
            .field("flow_id", &self.flow_id)
            .field("sender_id", &self.sender_id)
            .field("flow_url", &self.flow_url)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl Msg91Channel {
    pub fn new(config: &SmsConfig) -> Result<Self, BizchatError> {
        let auth_key = match config.msg91_auth_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let mut value = HeaderValue::from_str(key).map_err(|e| {
                    BizchatError::Config(format!("invalid MSG91 auth key header value: {e}"))
                })?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BizchatError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            auth_key,
            flow_id: config.msg91_flow_id.clone().filter(|f| !f.is_empty()),
            sender_id: config.msg91_sender_id.clone(),
            flow_url: format!(
                "{}/api/v5/flow/",
                config.msg91_api_base.trim_end_matches('/')
            ),
            max_length: config.max_length,
            client,
            templates: None,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn with_templates(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.templates = Some(storage);
        self
    }
}

#[async_trait]
impl PluginAdapter for Msg91Channel {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        if self.auth_key.is_some() && self.flow_id.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "MSG91 auth key or flow id is not configured".into(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        debug!("MSG91 channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for Msg91Channel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Sms
    }

    async fn initialize(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        if self.auth_key.is_none() || self.flow_id.is_none() {
            warn!("sms.msg91_auth_key and sms.msg91_flow_id are required to send");
            return false;
        }
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(sender_id = %self.sender_id, "MSG91 channel initialized");
        }
        true
    }

    async fn send_text(&self, to: &str, text: &str) -> SendResult {
        let (Some(auth_key), Some(flow_id)) = (&self.auth_key, &self.flow_id) else {
            return SendResult::failed("MSG91 auth key or flow id is not configured");
        };

        let body = serde_json::json!({
            "flow_id": flow_id,
            "sender": self.sender_id,
            "mobiles": without_plus(to),
            "VAR1": truncate_sms(text, self.max_length),
        });

        debug!("MSG91 API POST /api/v5/flow/");
        let response = match self
            .client
            .post(&self.flow_url)
            .header("authkey", auth_key.clone())
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SendResult::failed(format!("MSG91 request failed: {e}")),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return SendResult::failed(format!("failed to read MSG91 response: {e}")),
        };
        let parsed = serde_json::from_str::<FlowResponse>(&text).ok();

        match parsed {
            Some(flow) if status.is_success() && flow.kind == "success" => SendResult::Sent {
                message_id: flow.message.filter(|m| !m.is_empty()),
            },
            Some(flow) => {
                let detail = flow.message.unwrap_or_else(|| "SMS send failed".into());
                warn!(status = %status, detail = %detail, "MSG91 API error");
                SendResult::failed(format!("MSG91 returned {status}: {detail}"))
            }
            None => {
                warn!(status = %status, "unparseable MSG91 response");
                SendResult::failed(format!("MSG91 returned {status}: {text}"))
            }
        }
    }

    async fn send_template(
        &self,
        to: &str,
        template: &str,
        params: &BTreeMap<String, String>,
    ) -> SendResult {
        match render_stored_template(self.templates.as_ref(), template, ChannelType::Sms, params)
            .await
        {
            Ok(text) => self.send_text(to, &text).await,
            Err(error) => SendResult::failed(error),
        }
    }

    fn process_incoming(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Vec<StandardizedMessage>, BizchatError> {
        normalize_payload(payload)
    }
}

#[cfg(test)]
mod tests {
    use bizchat_config::model::StorageConfig;
    use bizchat_storage::{Database, SqliteStorage};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(api_base: &str) -> SmsConfig {
        SmsConfig {
            enabled: true,
            msg91_auth_key: Some("auth-key".into()),
            msg91_flow_id: Some("flow-1".into()),
            msg91_api_base: api_base.into(),
            ..SmsConfig::default()
        }
    }

    #[test]
    fn truncation_keeps_single_segment() {
        let long = "x".repeat(200);
        let cut = truncate_sms(&long, 160);
        assert_eq!(cut.chars().count(), 160);
        assert!(cut.ends_with("..."));
        assert_eq!(&cut[..157], &long[..157]);

        assert_eq!(truncate_sms("short", 160), "short");
        assert_eq!(truncate_sms(&"y".repeat(160), 160).len(), 160);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "₹".repeat(170);
        let cut = truncate_sms(&text, 160);
        assert_eq!(cut.chars().count(), 160);
    }

    #[test]
    fn normalizes_inbound_sms() {
        let payload = Msg91Payload {
            msisdn: Some("919876543210".into()),
            message: Some("Pay".into()),
            request_id: Some("req-1".into()),
            received_at: Some("2026-01-15 10:30:00".into()),
            keyword: None,
        };
        let msg = normalize(&payload).unwrap();
        assert_eq!(msg.from, "+919876543210");
        assert_eq!(msg.id, "req-1");
        assert_eq!(msg.channel, ChannelType::Sms);
        assert_eq!(msg.text(), Some("Pay"));
        assert_eq!(msg.timestamp.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn missing_fields_fail_closed() {
        let no_sender = Msg91Payload {
            message: Some("hi".into()),
            ..Default::default()
        };
        assert!(matches!(
            normalize(&no_sender),
            Err(BizchatError::InvalidPayload(_))
        ));
        let no_text = Msg91Payload {
            msisdn: Some("919876543210".into()),
            ..Default::default()
        };
        assert!(normalize(&no_text).is_err());
    }

    #[tokio::test]
    async fn send_strips_plus_and_truncates() {
        let server = MockServer::start().await;
        let expected = format!("{}...", "a".repeat(157));
        Mock::given(method("POST"))
            .and(path("/api/v5/flow/"))
            .and(header("authkey", "auth-key"))
            .and(body_partial_json(serde_json::json!({
                "flow_id": "flow-1",
                "mobiles": "919876543210",
                "VAR1": expected,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "success", "message": "3763646c3058373530393832"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = Msg91Channel::new(&config(&server.uri())).unwrap();
        assert!(channel.initialize().await);
        let result = channel.send_text("+919876543210", &"a".repeat(300)).await;
        assert_eq!(result.message_id(), Some("3763646c3058373530393832"));
    }

    #[tokio::test]
    async fn error_type_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "error", "message": "Invalid authkey"
            })))
            .mount(&server)
            .await;

        let channel = Msg91Channel::new(&config(&server.uri())).unwrap();
        let result = channel.send_text("+919876543210", "hi").await;
        assert!(result.error().unwrap().contains("Invalid authkey"));
    }

    #[tokio::test]
    async fn unconfigured_channel_reports_degraded() {
        let channel = Msg91Channel::new(&SmsConfig::default()).unwrap();
        assert!(!channel.initialize().await);
        assert!(matches!(
            channel.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
        assert!(!channel.send_text("+91", "hi").await.is_success());
    }

    #[tokio::test]
    async fn template_is_rendered_from_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "VAR1": "Order 42 shipped"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "success", "message": "m-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let db = Database::open_in_memory().await.unwrap();
        let storage = Arc::new(SqliteStorage::from_database(StorageConfig::default(), db));
        storage
            .upsert_template("shipped", ChannelType::Sms, "Order {{order}} shipped")
            .await
            .unwrap();

        let channel = Msg91Channel::new(&config(&server.uri()))
            .unwrap()
            .with_templates(storage);
        let params = BTreeMap::from([("order".to_string(), "42".to_string())]);
        assert!(channel.send_template("+91", "shipped", &params).await.is_success());
    }
}
