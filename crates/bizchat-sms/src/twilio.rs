// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio Programmable Messaging adapter for WhatsApp and SMS.
//!
//! One Twilio account serves both channels. WhatsApp addresses carry a
//! `whatsapp:` prefix on the wire which never reaches storage.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bizchat_config::model::TwilioConfig;
use bizchat_core::phone::{canonical_phone, is_whatsapp_address, whatsapp_address};
use bizchat_core::time::normalize_timestamp;
use bizchat_core::types::{
    AdapterType, ChannelType, HealthStatus, MessagePayload, OutboundMedia, SendResult,
    StandardizedMessage,
};
use bizchat_core::webhook::TwilioPayload;
use bizchat_core::{BizchatError, MessageChannel, PluginAdapter, StorageAdapter, WebhookPayload};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{normalize_payload, render_stored_template};

pub const PROVIDER: &str = "twilio";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Normalize a Twilio webhook. The channel follows the `From` prefix.
pub fn normalize(payload: &TwilioPayload) -> Result<StandardizedMessage, BizchatError> {
    let from = canonical_phone(&payload.from);
    if from.is_empty() {
        return Err(BizchatError::InvalidPayload(
            "twilio webhook: From holds no number".into(),
        ));
    }
    let channel = if is_whatsapp_address(&payload.from) {
        ChannelType::WhatsApp
    } else {
        ChannelType::Sms
    };

    let body = payload
        .body
        .as_deref()
        .map(str::to_string)
        .filter(|b| !b.is_empty());

    let content = if payload.media_count() > 0
        && let Some(url) = payload.media_url0.clone()
    {
        let is_image = payload
            .media_content_type0
            .as_deref()
            .is_none_or(|ct| ct.starts_with("image/"));
        if is_image {
            MessagePayload::Image { url: Some(url), caption: body }
        } else {
            MessagePayload::Document {
                url: Some(url),
                filename: None,
                caption: body,
            }
        }
    } else if let (Some(lat), Some(lng)) = (
        payload.latitude.as_deref().and_then(|v| v.trim().parse::<f64>().ok()),
        payload.longitude.as_deref().and_then(|v| v.trim().parse::<f64>().ok()),
    ) {
        MessagePayload::Location {
            latitude: lat,
            longitude: lng,
            name: payload.label.clone(),
            address: payload.address.clone(),
        }
    } else if let Some(button) = payload.button_payload.clone().filter(|p| !p.is_empty()) {
        MessagePayload::Button {
            text: payload.button_text.clone().unwrap_or_else(|| button.clone()),
            payload: button,
        }
    } else {
        let body = payload.body.clone().ok_or_else(|| {
            BizchatError::InvalidPayload("twilio webhook: missing Body".into())
        })?;
        MessagePayload::Text { body }
    };

    let id = payload
        .message_sid
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(StandardizedMessage {
        id,
        from,
        timestamp: normalize_timestamp(None),
        channel,
        payload: content,
        provider: PROVIDER.to_string(),
        business_number: payload
            .to
            .as_deref()
            .map(canonical_phone)
            .filter(|n| !n.is_empty()),
        sender_name: payload.profile_name.clone().filter(|n| !n.is_empty()),
    })
}

/// Twilio-backed channel. Construct one per channel type.
pub struct TwilioChannel {
    channel: ChannelType,
    from: Option<String>,
    messages_url: Option<String>,
    authorization: Option<HeaderValue>,
    client: reqwest::Client,
    templates: Option<Arc<dyn StorageAdapter>>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for TwilioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioChannel")
            .field("channel", &self.channel)
            .field("from", &self.from)
            .field("messages_url", &self.messages_url)
            .field("authorization", &self.authorization.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl TwilioChannel {
    /// WhatsApp channel sending from `twilio.whatsapp_number`.
    pub fn whatsapp(config: &TwilioConfig) -> Result<Self, BizchatError> {
        Self::build(config, ChannelType::WhatsApp, config.whatsapp_number.as_deref())
    }

    /// SMS channel sending from `twilio.sms_number`.
    pub fn sms(config: &TwilioConfig) -> Result<Self, BizchatError> {
        Self::build(config, ChannelType::Sms, config.sms_number.as_deref())
    }

    fn build(
        config: &TwilioConfig,
        channel: ChannelType,
        from: Option<&str>,
    ) -> Result<Self, BizchatError> {
        let sid = config.account_sid.as_deref().filter(|s| !s.is_empty());
        let token = config.auth_token.as_deref().filter(|s| !s.is_empty());

        let (messages_url, authorization) = match (sid, token) {
            (Some(sid), Some(token)) => {
                let encoded = STANDARD.encode(format!("{sid}:{token}"));
                let mut value = HeaderValue::from_str(&format!("Basic {encoded}")).map_err(|e| {
                    BizchatError::Config(format!("invalid Twilio credential header value: {e}"))
                })?;
                value.set_sensitive(true);
                let url = format!(
                    "{}/2010-04-01/Accounts/{sid}/Messages.json",
                    config.api_base.trim_end_matches('/')
                );
                (Some(url), Some(value))
            }
            _ => (None, None),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BizchatError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            channel,
            from: from
                .map(canonical_phone)
                .filter(|n| !n.is_empty()),
            messages_url,
            authorization,
            client,
            templates: None,
            initialized: AtomicBool::new(false),
        })
    }

    /// Resolve `send_template` names against the template store.
    pub fn with_templates(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.templates = Some(storage);
        self
    }

    /// Wire address for a canonical number on this channel.
    fn address(&self, canonical: &str) -> String {
        match self.channel {
            ChannelType::WhatsApp => whatsapp_address(canonical),
            _ => canonical.to_string(),
        }
    }

    async fn post_form(&self, to: &str, extra: &[(&str, &str)]) -> SendResult {
        let (Some(url), Some(auth), Some(from)) =
            (&self.messages_url, &self.authorization, &self.from)
        else {
            return SendResult::failed("Twilio credentials or sender number are not configured");
        };

        let to = self.address(to);
        let from = self.address(from);
        let mut fields: Vec<(&str, &str)> = vec![("To", to.as_str()), ("From", from.as_str())];
        fields.extend_from_slice(extra);
        let body = match serde_urlencoded::to_string(&fields) {
            Ok(body) => body,
            Err(e) => return SendResult::failed(format!("failed to encode Twilio form: {e}")),
        };

        debug!(channel = %self.channel, "Twilio API POST Messages.json");
        let response = match self
            .client
            .post(url)
            .header(AUTHORIZATION, auth.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SendResult::failed(format!("Twilio request failed: {e}")),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return SendResult::failed(format!("failed to read Twilio response: {e}")),
        };

        if !status.is_success() {
            let detail = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(ErrorResponse {
                    message,
                    code: Some(code),
                }) => format!("{message} (code {code})"),
                Ok(ErrorResponse { message, .. }) => message,
                Err(_) => text,
            };
            warn!(status = %status, detail = %detail, "Twilio API error");
            return SendResult::failed(format!("Twilio API returned {status}: {detail}"));
        }

        match serde_json::from_str::<MessageResponse>(&text) {
            Ok(parsed) => SendResult::sent(parsed.sid),
            Err(_) => SendResult::Sent { message_id: None },
        }
    }
}

#[async_trait]
impl PluginAdapter for TwilioChannel {
    fn name(&self) -> &str {
        match self.channel {
            ChannelType::WhatsApp => "twilio-whatsapp",
            _ => "twilio-sms",
        }
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        if self.authorization.is_some() && self.from.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "Twilio credentials or sender number are not configured".into(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        debug!(channel = %self.channel, "Twilio channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for TwilioChannel {
    fn channel_type(&self) -> ChannelType {
        self.channel
    }

    async fn initialize(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        if self.authorization.is_none() || self.from.is_none() {
            warn!(channel = %self.channel, "twilio.account_sid, twilio.auth_token and a sender number are required to send");
            return false;
        }
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(channel = %self.channel, "Twilio channel initialized");
        }
        true
    }

    async fn send_text(&self, to: &str, text: &str) -> SendResult {
        self.post_form(to, &[("Body", text)]).await
    }

    async fn send_template(
        &self,
        to: &str,
        template: &str,
        params: &BTreeMap<String, String>,
    ) -> SendResult {
        match render_stored_template(self.templates.as_ref(), template, self.channel, params).await
        {
            Ok(text) => self.send_text(to, &text).await,
            Err(error) => SendResult::failed(error),
        }
    }

    async fn send_media(&self, to: &str, media: &OutboundMedia) -> SendResult {
        let caption = media.caption().unwrap_or_default();
        self.post_form(to, &[("Body", caption), ("MediaUrl", media.url())])
            .await
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
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(api_base: &str) -> TwilioConfig {
        TwilioConfig {
            account_sid: Some("AC123".into()),
            auth_token: Some("secret".into()),
            whatsapp_number: Some("+14155238886".into()),
            sms_number: Some("+14155550000".into()),
            api_base: api_base.into(),
            validate_signatures: false,
        }
    }

    fn form(body: &str) -> TwilioPayload {
        match WebhookPayload::twilio_from_form(body.as_bytes()).unwrap() {
            WebhookPayload::Twilio(p) => p,
            other => panic!("expected twilio payload, got {other:?}"),
        }
    }

    #[test]
    fn whatsapp_prefix_selects_channel_and_is_stripped() {
        let msg = normalize(&form(
            "From=whatsapp%3A%2B919876543210&To=whatsapp%3A%2B14155238886&Body=pay&MessageSid=SM1&ProfileName=Ravi",
        ))
        .unwrap();
        assert_eq!(msg.channel, ChannelType::WhatsApp);
        assert_eq!(msg.from, "+919876543210");
        assert_eq!(msg.business_number.as_deref(), Some("+14155238886"));
        assert_eq!(msg.sender_name.as_deref(), Some("Ravi"));
        assert_eq!(msg.text(), Some("pay"));
        assert_eq!(msg.id, "SM1");
        assert_eq!(msg.provider, "twilio");
    }

    #[test]
    fn plain_number_is_sms() {
        let msg = normalize(&form("From=%2B14155550100&Body=2&MessageSid=SM2")).unwrap();
        assert_eq!(msg.channel, ChannelType::Sms);
        assert_eq!(msg.from, "+14155550100");
    }

    #[test]
    fn media_becomes_image_or_document() {
        let image = normalize(&form(
            "From=whatsapp%3A%2B1&Body=look&NumMedia=1&MediaUrl0=https%3A%2F%2Fm%2F1&MediaContentType0=image%2Fjpeg",
        ))
        .unwrap();
        assert_eq!(
            image.payload,
            MessagePayload::Image {
                url: Some("https://m/1".into()),
                caption: Some("look".into())
            }
        );

        let doc = normalize(&form(
            "From=whatsapp%3A%2B1&Body=&NumMedia=1&MediaUrl0=https%3A%2F%2Fm%2F2&MediaContentType0=application%2Fpdf",
        ))
        .unwrap();
        assert!(matches!(doc.payload, MessagePayload::Document { caption: None, .. }));
    }

    #[test]
    fn location_and_button_fields() {
        let loc = normalize(&form(
            "From=whatsapp%3A%2B1&Latitude=12.97&Longitude=77.59&Label=Office",
        ))
        .unwrap();
        assert!(matches!(
            loc.payload,
            MessagePayload::Location { name: Some(ref n), .. } if n == "Office"
        ));

        let button = normalize(&form(
            "From=whatsapp%3A%2B1&Body=Pay+now&ButtonPayload=pay_500&ButtonText=Pay+now",
        ))
        .unwrap();
        assert_eq!(
            button.payload,
            MessagePayload::Button {
                payload: "pay_500".into(),
                text: "Pay now".into()
            }
        );
    }

    #[test]
    fn missing_body_fails_closed() {
        let err = normalize(&form("From=%2B14155550100&MessageSid=SM3")).unwrap_err();
        assert!(matches!(err, BizchatError::InvalidPayload(_)));
        let err = normalize(&form("From=whatsapp%3A&Body=hi")).unwrap_err();
        assert!(matches!(err, BizchatError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn whatsapp_send_readds_prefix_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(header("authorization", "Basic QUMxMjM6c2VjcmV0"))
            .and(body_string_contains("To=whatsapp%3A%2B919876543210"))
            .and(body_string_contains("From=whatsapp%3A%2B14155238886"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "SM100", "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TwilioChannel::whatsapp(&config(&server.uri())).unwrap();
        assert!(channel.initialize().await);
        let result = channel.send_text("+919876543210", "hello").await;
        assert_eq!(result.message_id(), Some("SM100"));
    }

    #[tokio::test]
    async fn sms_send_keeps_plus() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("To=%2B14155550100"))
            .and(body_string_contains("MediaUrl=https%3A%2F%2Fexample.com%2Finvoice.pdf"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"sid": "SM7"})))
            .expect(1)
            .mount(&server)
            .await;

        let channel = TwilioChannel::sms(&config(&server.uri())).unwrap();
        let media = OutboundMedia::Document {
            url: "https://example.com/invoice.pdf".into(),
            filename: None,
            caption: None,
        };
        assert!(channel.send_media("+14155550100", &media).await.is_success());
    }

    #[tokio::test]
    async fn api_error_is_reported_in_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 21211, "message": "Invalid 'To' Phone Number", "status": 400
            })))
            .mount(&server)
            .await;

        let channel = TwilioChannel::sms(&config(&server.uri())).unwrap();
        let result = channel.send_text("+1", "hi").await;
        let error = result.error().unwrap();
        assert!(error.contains("21211"));
    }

    #[tokio::test]
    async fn unconfigured_channel_fails_without_network() {
        let channel = TwilioChannel::sms(&TwilioConfig::default()).unwrap();
        assert!(!channel.initialize().await);
        assert!(!channel.send_text("+1", "hi").await.is_success());
        assert!(matches!(
            channel.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn missing_template_fails() {
        let channel = TwilioChannel::sms(&config("http://localhost")).unwrap();
        let result = channel
            .send_template("+1", "welcome", &BTreeMap::new())
            .await;
        assert!(result.error().unwrap().contains("welcome"));
    }
}
