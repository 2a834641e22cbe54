// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AWS SNS two-way SMS deliveries.
//!
//! SNS wraps the Pinpoint SMS event as a JSON string in `Message`. Only
//! `Notification` envelopes carry customer text.

use bizchat_core::phone::canonical_phone;
use bizchat_core::time::normalize_timestamp;
use bizchat_core::types::{ChannelType, MessagePayload, StandardizedMessage};
use bizchat_core::webhook::SnsEnvelope;
use bizchat_core::BizchatError;
use tracing::{debug, info};

pub const PROVIDER: &str = "sns";

pub fn normalize(envelope: &SnsEnvelope) -> Result<Vec<StandardizedMessage>, BizchatError> {
    if envelope.is_subscription_confirmation() {
        info!(
            subscribe_url = envelope.subscribe_url.as_deref().unwrap_or(""),
            "SNS subscription confirmation received; confirm it from the AWS console or the URL"
        );
        return Ok(Vec::new());
    }
    if !envelope.is_notification() {
        debug!(kind = %envelope.kind, "ignoring SNS envelope");
        return Ok(Vec::new());
    }

    let sms = envelope.sms()?;
    let from = sms
        .origination_number
        .as_deref()
        .map(canonical_phone)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| BizchatError::InvalidPayload("sns message: missing originationNumber".into()))?;
    let body = sms
        .message_body
        .ok_or_else(|| BizchatError::InvalidPayload("sns message: missing messageBody".into()))?;

    let id = sms
        .inbound_message_id
        .or_else(|| envelope.message_id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(vec![StandardizedMessage {
        id,
        from,
        timestamp: normalize_timestamp(envelope.timestamp.as_deref()),
        channel: ChannelType::Sms,
        payload: MessagePayload::Text { body },
        provider: PROVIDER.to_string(),
        business_number: sms
            .destination_number
            .as_deref()
            .map(canonical_phone)
            .filter(|n| !n.is_empty()),
        sender_name: None,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(kind: &str, message: &str) -> SnsEnvelope {
        SnsEnvelope {
            kind: kind.into(),
            message_id: Some("env-1".into()),
            message: message.into(),
            timestamp: Some("2026-01-15T10:30:00.000Z".into()),
            subscribe_url: Some("https://sns.example/confirm".into()),
        }
    }

    #[test]
    fn notification_is_normalized() {
        let inner = r#"{"originationNumber":"+14155550100","destinationNumber":"+18005550199","messageBody":"price","inboundMessageId":"in-1"}"#;
        let messages = normalize(&envelope("Notification", inner)).unwrap();
        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        assert_eq!(msg.id, "in-1");
        assert_eq!(msg.from, "+14155550100");
        assert_eq!(msg.business_number.as_deref(), Some("+18005550199"));
        assert_eq!(msg.channel, ChannelType::Sms);
        assert_eq!(msg.text(), Some("price"));
        assert_eq!(msg.timestamp.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn falls_back_to_envelope_id() {
        let inner = r#"{"phoneNumber":"14155550100","message":"hi"}"#;
        let messages = normalize(&envelope("Notification", inner)).unwrap();
        assert_eq!(messages[0].id, "env-1");
        assert_eq!(messages[0].from, "+14155550100");
    }

    #[test]
    fn subscription_confirmation_yields_nothing() {
        assert!(normalize(&envelope("SubscriptionConfirmation", "{}")).unwrap().is_empty());
        assert!(normalize(&envelope("UnsubscribeConfirmation", "{}")).unwrap().is_empty());
    }

    #[test]
    fn malformed_inner_message_fails_closed() {
        assert!(normalize(&envelope("Notification", "not json")).is_err());
        assert!(normalize(&envelope("Notification", r#"{"messageBody":"hi"}"#)).is_err());
    }
}
