// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Bizchat router.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter in the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Payment,
    Audit,
}

/// A messaging transport with its own webhook format and send API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    WhatsApp,
    Sms,
    Web,
}

/// Discriminant of a [`MessagePayload`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Document,
    Location,
    Button,
    Template,
}

/// Type-specific content of an inbound message.
///
/// Exactly one variant exists per message, so the kind and the payload can
/// never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text {
        body: String,
    },
    Image {
        url: Option<String>,
        caption: Option<String>,
    },
    Document {
        url: Option<String>,
        filename: Option<String>,
        caption: Option<String>,
    },
    Location {
        latitude: f64,
        longitude: f64,
        name: Option<String>,
        address: Option<String>,
    },
    Button {
        payload: String,
        text: String,
    },
    Template {
        name: String,
        parameters: BTreeMap<String, String>,
    },
}

impl MessagePayload {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessagePayload::Text { .. } => MessageKind::Text,
            MessagePayload::Image { .. } => MessageKind::Image,
            MessagePayload::Document { .. } => MessageKind::Document,
            MessagePayload::Location { .. } => MessageKind::Location,
            MessagePayload::Button { .. } => MessageKind::Button,
            MessagePayload::Template { .. } => MessageKind::Template,
        }
    }
}

/// Channel-agnostic representation of one inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedMessage {
    /// Provider-assigned message id, used for idempotency.
    pub id: String,
    /// Customer contact in canonical E.164 form (leading `+`).
    pub from: String,
    pub timestamp: DateTime<Utc>,
    pub channel: ChannelType,
    pub payload: MessagePayload,
    /// Adapter that produced this message (`whatsapp-cloud`, `twilio`, `msg91`, `sns`).
    pub provider: String,
    /// The business-side number the customer wrote to, when the provider reports it.
    pub business_number: Option<String>,
    /// Customer display name, when the provider reports it.
    pub sender_name: Option<String>,
}

impl StandardizedMessage {
    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// The text body for text messages.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::Text { body } => Some(body),
            _ => None,
        }
    }

    /// Media reference carried by image and document messages.
    pub fn media_url(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::Image { url, .. } | MessagePayload::Document { url, .. } => {
                url.as_deref()
            }
            _ => None,
        }
    }

    /// Content persisted for this message, synthesized for non-text kinds.
    pub fn stored_content(&self) -> String {
        match &self.payload {
            MessagePayload::Text { body } => body.clone(),
            MessagePayload::Image { caption, .. } => caption
                .clone()
                .unwrap_or_else(|| "Image received".to_string()),
            MessagePayload::Document {
                caption, filename, ..
            } => caption
                .clone()
                .or_else(|| filename.clone())
                .unwrap_or_else(|| "Document received".to_string()),
            MessagePayload::Location {
                latitude,
                longitude,
                name,
                ..
            } => name
                .clone()
                .unwrap_or_else(|| format!("Location: {latitude}, {longitude}")),
            MessagePayload::Button { text, .. } => format!("Button clicked: {text}"),
            MessagePayload::Template { name, .. } => format!("Template: {name}"),
        }
    }
}

/// Outcome of an outbound send. Provider failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    Sent { message_id: Option<String> },
    Failed { error: String },
}

impl SendResult {
    pub fn sent(message_id: impl Into<String>) -> Self {
        SendResult::Sent {
            message_id: Some(message_id.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        SendResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SendResult::Sent { .. })
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            SendResult::Sent { message_id } => message_id.as_deref(),
            SendResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SendResult::Sent { .. } => None,
            SendResult::Failed { error } => Some(error),
        }
    }
}

/// Media attachment for an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMedia {
    Image {
        url: String,
        caption: Option<String>,
    },
    Document {
        url: String,
        filename: Option<String>,
        caption: Option<String>,
    },
}

impl OutboundMedia {
    pub fn url(&self) -> &str {
        match self {
            OutboundMedia::Image { url, .. } | OutboundMedia::Document { url, .. } => url,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            OutboundMedia::Image { caption, .. } | OutboundMedia::Document { caption, .. } => {
                caption.as_deref()
            }
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            OutboundMedia::Image { .. } => MessageKind::Image,
            OutboundMedia::Document { .. } => MessageKind::Document,
        }
    }
}

/// Who authored a persisted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    Customer,
    Business,
    System,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Received,
    Sent,
    Delivered,
    Read,
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Closed,
}

/// A (business, customer, channel) thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub business_id: String,
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub channel: ChannelType,
    pub status: ConversationStatus,
    /// ISO 8601 timestamp of the most recently processed message.
    pub last_message_at: String,
    pub last_message_preview: Option<String>,
    pub created_at: String,
}

/// One persisted turn in a conversation. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub channel: ChannelType,
    pub sender: SenderRole,
    pub kind: MessageKind,
    pub content: String,
    pub media_url: Option<String>,
    pub provider_message_id: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub created_at: String,
}

/// A message about to be appended to a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: String,
    pub channel: ChannelType,
    pub sender: SenderRole,
    pub kind: MessageKind,
    pub content: String,
    pub media_url: Option<String>,
    pub provider_message_id: Option<String>,
    pub delivery_status: DeliveryStatus,
}

impl NewMessage {
    /// The stored form of an inbound customer message.
    pub fn inbound(conversation: &Conversation, msg: &StandardizedMessage) -> Self {
        Self {
            conversation_id: conversation.id.clone(),
            channel: msg.channel,
            sender: SenderRole::Customer,
            kind: msg.kind(),
            content: msg.stored_content(),
            media_url: msg.media_url().map(str::to_string),
            provider_message_id: Some(msg.id.clone()),
            delivery_status: DeliveryStatus::Received,
        }
    }

    /// The stored form of a reply that the provider accepted.
    pub fn outbound(
        conversation: &Conversation,
        kind: MessageKind,
        content: impl Into<String>,
        media_url: Option<String>,
        provider_message_id: Option<String>,
    ) -> Self {
        Self {
            conversation_id: conversation.id.clone(),
            channel: conversation.channel,
            sender: SenderRole::Business,
            kind,
            content: content.into(),
            media_url,
            provider_message_id,
            delivery_status: DeliveryStatus::Sent,
        }
    }
}

/// Result of appending a message.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Inserted(Message),
    /// A message with the same provider id already exists on this channel.
    Duplicate,
}

/// A business account that receives customer messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    /// Business-side number in canonical form.
    pub phone: Option<String>,
    /// UPI virtual payment address used as payee.
    pub upi_id: Option<String>,
    pub gstin: Option<String>,
    /// ISO 3166 alpha-2 country code.
    pub country: Option<String>,
}

/// A product offered by a business, shown in order and price replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub price: crate::payment::Money,
}

/// An event written to the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn resource(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn message(payload: MessagePayload) -> StandardizedMessage {
        StandardizedMessage {
            id: "wamid.1".into(),
            from: "+919876543210".into(),
            timestamp: Utc::now(),
            channel: ChannelType::WhatsApp,
            payload,
            provider: "whatsapp-cloud".into(),
            business_number: None,
            sender_name: None,
        }
    }

    #[test]
    fn channel_type_round_trips_lowercase() {
        for channel in [ChannelType::WhatsApp, ChannelType::Sms, ChannelType::Web] {
            let s = channel.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(ChannelType::from_str(&s).unwrap(), channel);
        }
        assert_eq!(ChannelType::WhatsApp.to_string(), "whatsapp");
        let json = serde_json::to_string(&ChannelType::Sms).unwrap();
        assert_eq!(json, "\"sms\"");
    }

    #[test]
    fn stored_content_synthesizes_placeholders() {
        let image = message(MessagePayload::Image {
            url: None,
            caption: None,
        });
        assert_eq!(image.stored_content(), "Image received");

        let doc = message(MessagePayload::Document {
            url: None,
            filename: Some("invoice.pdf".into()),
            caption: None,
        });
        assert_eq!(doc.stored_content(), "invoice.pdf");

        let loc = message(MessagePayload::Location {
            latitude: 12.5,
            longitude: 77.25,
            name: None,
            address: None,
        });
        assert_eq!(loc.stored_content(), "Location: 12.5, 77.25");

        let button = message(MessagePayload::Button {
            payload: "pay_500".into(),
            text: "Pay now".into(),
        });
        assert_eq!(button.stored_content(), "Button clicked: Pay now");
    }

    #[test]
    fn kind_matches_payload() {
        let msg = message(MessagePayload::Text {
            body: "hello".into(),
        });
        assert_eq!(msg.kind(), MessageKind::Text);
        assert_eq!(msg.text(), Some("hello"));
        assert!(msg.media_url().is_none());
    }

    #[test]
    fn send_result_accessors() {
        let ok = SendResult::sent("SM123");
        assert!(ok.is_success());
        assert_eq!(ok.message_id(), Some("SM123"));
        assert!(ok.error().is_none());

        let failed = SendResult::failed("HTTP 500");
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("HTTP 500"));
    }

    #[test]
    fn inbound_message_is_customer_received() {
        let conv = Conversation {
            id: "c1".into(),
            business_id: "b1".into(),
            customer_phone: "+919876543210".into(),
            customer_name: None,
            channel: ChannelType::WhatsApp,
            status: ConversationStatus::Active,
            last_message_at: "2026-01-01T00:00:00.000Z".into(),
            last_message_preview: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let msg = message(MessagePayload::Text { body: "hi".into() });
        let new = NewMessage::inbound(&conv, &msg);
        assert_eq!(new.sender, SenderRole::Customer);
        assert_eq!(new.delivery_status, DeliveryStatus::Received);
        assert_eq!(new.provider_message_id.as_deref(), Some("wamid.1"));
    }
}
