// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook payloads.
//!
//! Each provider gets its own typed payload. [`WebhookPayload`] tags them so
//! the provider is known before any adapter looks at the fields. The SMS
//! endpoint is shared by several providers and goes through
//! [`detect_sms_payload`].

use serde::Deserialize;

use crate::error::BizchatError;

/// A parsed inbound webhook body, tagged by provider.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookPayload {
    WhatsApp(WhatsAppPayload),
    Twilio(TwilioPayload),
    Sms(Msg91Payload),
    Sns(SnsEnvelope),
}

impl WebhookPayload {
    pub fn provider(&self) -> &'static str {
        match self {
            WebhookPayload::WhatsApp(_) => "whatsapp-cloud",
            WebhookPayload::Twilio(_) => "twilio",
            WebhookPayload::Sms(_) => "msg91",
            WebhookPayload::Sns(_) => "sns",
        }
    }

    /// Parse a WhatsApp Cloud API notification body.
    pub fn whatsapp_from_json(body: &[u8]) -> Result<Self, BizchatError> {
        serde_json::from_slice(body)
            .map(WebhookPayload::WhatsApp)
            .map_err(|e| BizchatError::InvalidPayload(format!("whatsapp webhook: {e}")))
    }

    /// Parse a Twilio form-encoded webhook body.
    pub fn twilio_from_form(body: &[u8]) -> Result<Self, BizchatError> {
        let payload: TwilioPayload = serde_urlencoded::from_bytes(body)
            .map_err(|e| BizchatError::InvalidPayload(format!("twilio webhook: {e}")))?;
        if payload.from.trim().is_empty() {
            return Err(BizchatError::InvalidPayload(
                "twilio webhook: missing From".into(),
            ));
        }
        Ok(WebhookPayload::Twilio(payload))
    }
}

// --- WhatsApp Cloud API ---

/// Top-level WhatsApp Cloud API webhook notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WhatsAppEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WhatsAppChange>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: WhatsAppValue,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WhatsAppValue {
    #[serde(default)]
    pub metadata: Option<WhatsAppMetadata>,
    #[serde(default)]
    pub contacts: Vec<WhatsAppContact>,
    #[serde(default)]
    pub messages: Vec<WhatsAppMessage>,
    /// Delivery receipts; acknowledged but not routed.
    #[serde(default)]
    pub statuses: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppMetadata {
    #[serde(default)]
    pub display_phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<WhatsAppProfile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppProfile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppMessage {
    pub from: String,
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<WhatsAppText>,
    #[serde(default)]
    pub image: Option<WhatsAppMedia>,
    #[serde(default)]
    pub document: Option<WhatsAppMedia>,
    #[serde(default)]
    pub location: Option<WhatsAppLocation>,
    #[serde(default)]
    pub button: Option<WhatsAppButton>,
    #[serde(default)]
    pub interactive: Option<WhatsAppInteractive>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppText {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppMedia {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Quick-reply button on a template message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppButton {
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppInteractive {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub button_reply: Option<WhatsAppReply>,
    #[serde(default)]
    pub list_reply: Option<WhatsAppReply>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhatsAppReply {
    pub id: String,
    pub title: String,
}

// --- Twilio ---

/// Flat form fields posted by Twilio for WhatsApp and SMS.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TwilioPayload {
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "MessageSid", alias = "SmsMessageSid", default)]
    pub message_sid: Option<String>,
    #[serde(rename = "NumMedia", default)]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0", default)]
    pub media_url0: Option<String>,
    #[serde(rename = "MediaContentType0", default)]
    pub media_content_type0: Option<String>,
    #[serde(rename = "ProfileName", default)]
    pub profile_name: Option<String>,
    #[serde(rename = "Latitude", default)]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    pub longitude: Option<String>,
    #[serde(rename = "Address", default)]
    pub address: Option<String>,
    #[serde(rename = "Label", default)]
    pub label: Option<String>,
    #[serde(rename = "ButtonPayload", default)]
    pub button_payload: Option<String>,
    #[serde(rename = "ButtonText", default)]
    pub button_text: Option<String>,
}

impl TwilioPayload {
    pub fn media_count(&self) -> u32 {
        self.num_media
            .as_deref()
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0)
    }
}

// --- MSG91 ---

/// MSG91 inbound SMS. Field names vary between MSG91 products.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Msg91Payload {
    #[serde(alias = "sender", default)]
    pub msisdn: Option<String>,
    #[serde(alias = "content", default)]
    pub message: Option<String>,
    #[serde(rename = "requestId", alias = "request_id", alias = "id", default)]
    pub request_id: Option<String>,
    #[serde(alias = "receivedAt", alias = "date", alias = "datetime", default)]
    pub received_at: Option<String>,
    /// Business-side number or keyword the SMS was sent to.
    #[serde(alias = "number", default)]
    pub keyword: Option<String>,
}

// --- AWS SNS ---

/// SNS HTTP delivery envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnsEnvelope {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "SubscribeURL", default)]
    pub subscribe_url: Option<String>,
}

/// Pinpoint/SNS two-way SMS notification carried inside `Message`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnsSmsMessage {
    #[serde(alias = "phoneNumber", default)]
    pub origination_number: Option<String>,
    #[serde(default)]
    pub destination_number: Option<String>,
    #[serde(alias = "message", default)]
    pub message_body: Option<String>,
    #[serde(alias = "messageId", default)]
    pub inbound_message_id: Option<String>,
}

impl SnsEnvelope {
    pub fn is_notification(&self) -> bool {
        self.kind == "Notification"
    }

    pub fn is_subscription_confirmation(&self) -> bool {
        self.kind == "SubscriptionConfirmation"
    }

    /// Decode the nested SMS notification.
    pub fn sms(&self) -> Result<SnsSmsMessage, BizchatError> {
        serde_json::from_str(&self.message)
            .map_err(|e| BizchatError::InvalidPayload(format!("sns message body: {e}")))
    }
}

// --- SMS provider detection ---

/// Provider hinted by request headers, checked before payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsProvider {
    Msg91,
    Twilio,
    Sns,
}

const PROVIDER_HEADERS: &[(&str, SmsProvider)] = &[
    ("x-msg91-signature", SmsProvider::Msg91),
    ("x-twilio-signature", SmsProvider::Twilio),
    ("x-amz-sns-message-type", SmsProvider::Sns),
];

/// Detect which provider posted to the shared SMS endpoint and parse it.
///
/// `has_header` answers whether a (lowercase) header name is present. Form
/// bodies are decoded as flat key/value pairs, everything else as JSON.
pub fn detect_sms_payload(
    has_header: impl Fn(&str) -> bool,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<WebhookPayload, BizchatError> {
    let fields = decode_fields(content_type, body)?;
    let hinted = PROVIDER_HEADERS
        .iter()
        .find(|(header, _)| has_header(header))
        .map(|(_, provider)| *provider);

    let provider = hinted
        .or_else(|| shape_of(&fields))
        .ok_or_else(|| BizchatError::InvalidPayload("unrecognized sms webhook payload".into()))?;

    let value = serde_json::Value::Object(fields);
    let invalid = |e: serde_json::Error| BizchatError::InvalidPayload(format!("sms webhook: {e}"));
    match provider {
        SmsProvider::Msg91 => {
            let payload: Msg91Payload = serde_json::from_value(value).map_err(invalid)?;
            if payload.msisdn.is_none() {
                return Err(BizchatError::InvalidPayload(
                    "msg91 webhook: missing sender".into(),
                ));
            }
            Ok(WebhookPayload::Sms(payload))
        }
        SmsProvider::Twilio => {
            let payload: TwilioPayload = serde_json::from_value(value).map_err(invalid)?;
            if payload.from.trim().is_empty() {
                return Err(BizchatError::InvalidPayload(
                    "twilio webhook: missing From".into(),
                ));
            }
            Ok(WebhookPayload::Twilio(payload))
        }
        SmsProvider::Sns => serde_json::from_value(value)
            .map(WebhookPayload::Sns)
            .map_err(invalid),
    }
}

fn decode_fields(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<serde_json::Map<String, serde_json::Value>, BizchatError> {
    let is_form = content_type
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| BizchatError::InvalidPayload(format!("form body: {e}")))?;
        return Ok(pairs
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect());
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, stringify_scalar(v)))
            .collect()),
        Ok(_) => Err(BizchatError::InvalidPayload(
            "sms webhook body is not an object".into(),
        )),
        Err(e) => Err(BizchatError::InvalidPayload(format!("sms webhook: {e}"))),
    }
}

/// Providers send numbers as JSON numbers or strings; payload structs take strings.
fn stringify_scalar(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Number(n) => serde_json::Value::String(n.to_string()),
        other => other,
    }
}

fn shape_of(fields: &serde_json::Map<String, serde_json::Value>) -> Option<SmsProvider> {
    let has = |key: &str| fields.contains_key(key);
    if has("msisdn") || has("sender") {
        Some(SmsProvider::Msg91)
    } else if has("From") && (has("MessageSid") || has("SmsMessageSid") || has("Body")) {
        Some(SmsProvider::Twilio)
    } else if has("Type") && has("Message") {
        Some(SmsProvider::Sns)
    } else {
        None
    }
}
