// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of Cloud API notifications into [`StandardizedMessage`]s.
//!
//! Messages live at `entry[].changes[].value.messages[]`. Sender numbers
//! arrive without `+` and are canonicalized here. Media carries only an id,
//! which is turned into the Graph URL that serves it.

use std::collections::HashMap;

use bizchat_core::phone::canonical_phone;
use bizchat_core::time::normalize_timestamp;
use bizchat_core::types::{ChannelType, MessagePayload, StandardizedMessage};
use bizchat_core::webhook::{WhatsAppMedia, WhatsAppMessage, WhatsAppPayload};
use bizchat_core::BizchatError;
use tracing::debug;

/// Only this object type carries WhatsApp Business messages.
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

pub const PROVIDER: &str = "whatsapp-cloud";

/// Base used to build media URLs from media ids.
#[derive(Debug, Clone)]
pub struct MediaBase {
    pub api_base: String,
    pub api_version: String,
}

impl MediaBase {
    fn url_for(&self, media: &WhatsAppMedia) -> Option<String> {
        if let Some(link) = media.link.as_deref().filter(|l| !l.is_empty()) {
            return Some(link.to_string());
        }
        media.id.as_deref().map(|id| {
            format!(
                "{}/{}/{id}",
                self.api_base.trim_end_matches('/'),
                self.api_version
            )
        })
    }
}

/// Extract every customer message from a notification.
///
/// Non-business objects and status-only notifications produce no messages.
pub fn normalize(
    payload: &WhatsAppPayload,
    media: &MediaBase,
) -> Result<Vec<StandardizedMessage>, BizchatError> {
    if payload.object != BUSINESS_ACCOUNT_OBJECT {
        debug!(object = %payload.object, "ignoring non-business webhook object");
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for change in payload.entry.iter().flat_map(|e| e.changes.iter()) {
        let value = &change.value;
        let business_number = value
            .metadata
            .as_ref()
            .and_then(|m| m.display_phone_number.as_deref())
            .map(canonical_phone)
            .filter(|n| !n.is_empty());
        let names: HashMap<&str, &str> = value
            .contacts
            .iter()
            .filter_map(|c| {
                c.profile
                    .as_ref()
                    .and_then(|p| p.name.as_deref())
                    .map(|name| (c.wa_id.as_str(), name))
            })
            .collect();

        if value.messages.is_empty() && !value.statuses.is_empty() {
            debug!(count = value.statuses.len(), "status notification, nothing to route");
        }

        for msg in &value.messages {
            let Some(payload) = to_payload(msg, media)? else {
                debug!(kind = %msg.kind, id = %msg.id, "ignoring unsupported WhatsApp message type");
                continue;
            };
            let from = canonical_phone(&msg.from);
            if from.is_empty() {
                return Err(BizchatError::InvalidPayload(format!(
                    "whatsapp message {} has no sender number",
                    msg.id
                )));
            }
            out.push(StandardizedMessage {
                id: msg.id.clone(),
                sender_name: names.get(msg.from.as_str()).map(|n| n.to_string()),
                from,
                timestamp: normalize_timestamp(msg.timestamp.as_deref()),
                channel: ChannelType::WhatsApp,
                payload,
                provider: PROVIDER.to_string(),
                business_number: business_number.clone(),
            });
        }
    }
    Ok(out)
}

fn missing(msg: &WhatsAppMessage, field: &str) -> BizchatError {
    BizchatError::InvalidPayload(format!(
        "whatsapp {} message {} is missing `{field}`",
        msg.kind, msg.id
    ))
}

fn to_payload(
    msg: &WhatsAppMessage,
    media: &MediaBase,
) -> Result<Option<MessagePayload>, BizchatError> {
    let payload = match msg.kind.as_str() {
        "text" => {
            let text = msg.text.as_ref().ok_or_else(|| missing(msg, "text"))?;
            MessagePayload::Text {
                body: text.body.clone(),
            }
        }
        "image" => {
            let image = msg.image.as_ref().ok_or_else(|| missing(msg, "image"))?;
            MessagePayload::Image {
                url: media.url_for(image),
                caption: image.caption.clone(),
            }
        }
        "document" => {
            let doc = msg
                .document
                .as_ref()
                .ok_or_else(|| missing(msg, "document"))?;
            MessagePayload::Document {
                url: media.url_for(doc),
                filename: doc.filename.clone(),
                caption: doc.caption.clone(),
            }
        }
        "location" => {
            let loc = msg
                .location
                .as_ref()
                .ok_or_else(|| missing(msg, "location"))?;
            MessagePayload::Location {
                latitude: loc.latitude,
                longitude: loc.longitude,
                name: loc.name.clone(),
                address: loc.address.clone(),
            }
        }
        "button" => {
            let button = msg.button.as_ref().ok_or_else(|| missing(msg, "button"))?;
            MessagePayload::Button {
                payload: button.payload.clone(),
                text: button.text.clone(),
            }
        }
        "interactive" => {
            let interactive = msg
                .interactive
                .as_ref()
                .ok_or_else(|| missing(msg, "interactive"))?;
            let reply = interactive
                .button_reply
                .as_ref()
                .or(interactive.list_reply.as_ref())
                .ok_or_else(|| missing(msg, "interactive reply"))?;
            MessagePayload::Button {
                payload: reply.id.clone(),
                text: reply.title.clone(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use bizchat_core::types::MessageKind;
    use bizchat_core::WebhookPayload;

    use super::*;

    fn media_base() -> MediaBase {
        MediaBase {
            api_base: "https://graph.facebook.com".into(),
            api_version: "v17.0".into(),
        }
    }

    fn parse(json: serde_json::Value) -> WhatsAppPayload {
        match WebhookPayload::whatsapp_from_json(json.to_string().as_bytes()).unwrap() {
            WebhookPayload::WhatsApp(p) => p,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    fn envelope(message: serde_json::Value) -> WhatsAppPayload {
        parse(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1234",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "metadata": {
                            "display_phone_number": "15550001111",
                            "phone_number_id": "pn-1"
                        },
                        "contacts": [{"wa_id": "919876543210", "profile": {"name": "Ravi"}}],
                        "messages": [message]
                    }
                }]
            }]
        }))
    }

    #[test]
    fn text_message_is_normalized() {
        let payload = envelope(serde_json::json!({
            "from": "919876543210",
            "id": "wamid.1",
            "timestamp": "1700000000",
            "type": "text",
            "text": {"body": "how much for product A"}
        }));
        let msgs = normalize(&payload, &media_base()).unwrap();
        assert_eq!(msgs.len(), 1);
        let msg = &msgs[0];
        assert_eq!(msg.from, "+919876543210");
        assert_eq!(msg.channel, ChannelType::WhatsApp);
        assert_eq!(msg.text(), Some("how much for product A"));
        assert_eq!(msg.business_number.as_deref(), Some("+15550001111"));
        assert_eq!(msg.sender_name.as_deref(), Some("Ravi"));
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn image_id_becomes_graph_url() {
        let payload = envelope(serde_json::json!({
            "from": "919876543210",
            "id": "wamid.2",
            "type": "image",
            "image": {"id": "media-9", "mime_type": "image/jpeg", "caption": "receipt"}
        }));
        let msgs = normalize(&payload, &media_base()).unwrap();
        assert_eq!(msgs[0].kind(), MessageKind::Image);
        assert_eq!(
            msgs[0].media_url(),
            Some("https://graph.facebook.com/v17.0/media-9")
        );
    }

    #[test]
    fn document_location_and_buttons() {
        let doc = envelope(serde_json::json!({
            "from": "919876543210", "id": "d", "type": "document",
            "document": {"id": "m1", "filename": "invoice.pdf"}
        }));
        assert_eq!(
            normalize(&doc, &media_base()).unwrap()[0].kind(),
            MessageKind::Document
        );

        let loc = envelope(serde_json::json!({
            "from": "919876543210", "id": "l", "type": "location",
            "location": {"latitude": 12.97, "longitude": 77.59, "name": "Shop"}
        }));
        assert_eq!(
            normalize(&loc, &media_base()).unwrap()[0].kind(),
            MessageKind::Location
        );

        let button = envelope(serde_json::json!({
            "from": "919876543210", "id": "b", "type": "button",
            "button": {"payload": "pay_500", "text": "Pay now"}
        }));
        let msg = &normalize(&button, &media_base()).unwrap()[0];
        assert_eq!(
            msg.payload,
            MessagePayload::Button {
                payload: "pay_500".into(),
                text: "Pay now".into()
            }
        );

        let interactive = envelope(serde_json::json!({
            "from": "919876543210", "id": "i", "type": "interactive",
            "interactive": {"type": "button_reply", "button_reply": {"id": "pay_250", "title": "Pay"}}
        }));
        let msg = &normalize(&interactive, &media_base()).unwrap()[0];
        assert_eq!(msg.kind(), MessageKind::Button);
    }

    #[test]
    fn status_notification_yields_nothing() {
        let payload = parse(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {
                "statuses": [{"id": "wamid.1", "status": "delivered"}]
            }}]}]
        }));
        assert!(normalize(&payload, &media_base()).unwrap().is_empty());
    }

    #[test]
    fn other_objects_are_ignored() {
        let payload = parse(serde_json::json!({"object": "page", "entry": []}));
        assert!(normalize(&payload, &media_base()).unwrap().is_empty());
    }

    #[test]
    fn unsupported_types_are_skipped() {
        let payload = envelope(serde_json::json!({
            "from": "919876543210", "id": "s", "type": "sticker",
            "sticker": {"id": "st"}
        }));
        assert!(normalize(&payload, &media_base()).unwrap().is_empty());
    }

    #[test]
    fn text_without_body_is_invalid() {
        let payload = envelope(serde_json::json!({
            "from": "919876543210", "id": "t", "type": "text"
        }));
        let err = normalize(&payload, &media_base()).unwrap_err();
        assert!(matches!(err, BizchatError::InvalidPayload(_)));
    }
}
