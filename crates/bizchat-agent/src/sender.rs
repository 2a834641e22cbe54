// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery with persistence of what was actually sent.
//!
//! A reply is recorded against the customer's most recent active
//! conversation only after the provider accepted it. Storage problems are
//! logged and never turn a delivered message into a failure.

use std::sync::Arc;

use bizchat_core::types::{AuditEvent, ChannelType, MessageKind, NewMessage, OutboundMedia};
use bizchat_core::{SendResult, record_detached};
use tracing::{debug, warn};

use crate::context::AppContext;

/// Something to deliver to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Media(OutboundMedia),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

#[derive(Clone)]
pub struct OutboundSender {
    ctx: Arc<AppContext>,
}

impl OutboundSender {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub async fn send(&self, to: &str, channel: ChannelType, reply: &Reply) -> SendResult {
        match reply {
            Reply::Text(text) => self.send_text(to, channel, text).await,
            Reply::Media(media) => self.send_media(to, channel, media).await,
        }
    }

    pub async fn send_text(&self, to: &str, channel: ChannelType, text: &str) -> SendResult {
        let result = match self.ctx.channels.get(channel).await {
            Ok(adapter) => adapter.send_text(to, text).await,
            Err(e) => SendResult::failed(e.to_string()),
        };
        self.settle(to, channel, MessageKind::Text, text, None, &result)
            .await;
        result
    }

    pub async fn send_media(
        &self,
        to: &str,
        channel: ChannelType,
        media: &OutboundMedia,
    ) -> SendResult {
        let result = match self.ctx.channels.get(channel).await {
            Ok(adapter) => adapter.send_media(to, media).await,
            Err(e) => SendResult::failed(e.to_string()),
        };
        let content = media.caption().unwrap_or(match media {
            OutboundMedia::Image { .. } => "Image sent",
            OutboundMedia::Document { .. } => "Document sent",
        });
        self.settle(
            to,
            channel,
            media.kind(),
            content,
            Some(media.url().to_string()),
            &result,
        )
        .await;
        result
    }

    async fn settle(
        &self,
        to: &str,
        channel: ChannelType,
        kind: MessageKind,
        content: &str,
        media_url: Option<String>,
        result: &SendResult,
    ) {
        let outcome = if result.is_success() { "sent" } else { "failed" };
        metrics::counter!(
            "bizchat_outbound_sent_total",
            "channel" => channel.to_string(),
            "outcome" => outcome
        )
        .increment(1);

        if let SendResult::Failed { error } = result {
            warn!(%channel, to, error = %error, "outbound message failed");
            record_detached(
                &self.ctx.audit,
                AuditEvent::new("outbound_failed", "message")
                    .resource(to.to_string())
                    .metadata(serde_json::json!({
                        "channel": channel.to_string(),
                        "error": error,
                    })),
            );
            return;
        }

        let conversation = match self
            .ctx
            .storage
            .find_latest_active_conversation(to, channel)
            .await
        {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                warn!(%channel, to, "sent message has no active conversation, not persisted");
                return;
            }
            Err(e) => {
                warn!(%channel, to, error = %e, "conversation lookup failed for sent message");
                return;
            }
        };

        let message = NewMessage::outbound(
            &conversation,
            kind,
            content,
            media_url,
            result.message_id().map(str::to_string),
        );
        match self.ctx.storage.append_message(&message).await {
            Ok(_) => debug!(conversation_id = %conversation.id, "outbound message persisted"),
            Err(e) => warn!(
                conversation_id = %conversation.id,
                error = %e,
                "failed to persist outbound message"
            ),
        }
    }
}
