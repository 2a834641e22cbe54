// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message pipeline: resolve, persist, classify, handle, reply.
//!
//! Every stage after the webhook acknowledgement runs here. Failures are
//! converted into an apology on the customer's channel so that no text
//! message goes unanswered; only duplicate deliveries stay silent.

use std::sync::Arc;

use bizchat_core::payment::TransactionStatus;
use bizchat_core::types::{AppendOutcome, AuditEvent, NewMessage, StandardizedMessage};
use bizchat_core::{BizchatError, record_detached};
use bizchat_payment::{CallbackOutcome, PaymentCallback};
use tracing::{debug, error, info, warn};

use crate::context::AppContext;
use crate::handlers::{self, Inbound};
use crate::replies;
use crate::resolver::ConversationResolver;
use crate::sender::{OutboundSender, Reply};

/// How a message left the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled {
        conversation_id: String,
        route: &'static str,
        replies_sent: usize,
    },
    /// Already processed under the same provider message id.
    Duplicate,
}

#[derive(Clone)]
pub struct MessageDispatcher {
    ctx: Arc<AppContext>,
    resolver: ConversationResolver,
    sender: OutboundSender,
}

impl MessageDispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            resolver: ConversationResolver::new(ctx.storage.clone()),
            sender: OutboundSender::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    pub fn sender(&self) -> &OutboundSender {
        &self.sender
    }

    /// Run one message through the pipeline.
    ///
    /// On error the customer has already been sent an apology; the error is
    /// returned for logging only.
    pub async fn dispatch(
        &self,
        message: StandardizedMessage,
    ) -> Result<DispatchOutcome, BizchatError> {
        record_detached(
            &self.ctx.audit,
            AuditEvent::new("message_received", "message")
                .resource(message.id.clone())
                .metadata(serde_json::json!({
                    "channel": message.channel.to_string(),
                    "provider": message.provider,
                    "from": message.from,
                    "type": message.kind().to_string(),
                })),
        );

        match self.process(&message).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(
                    message_id = %message.id,
                    channel = %message.channel,
                    error = %e,
                    "message processing failed"
                );
                self.record_failure(&message, &e);
                let apology = if e.is_payment() {
                    replies::PAYMENT_APOLOGY
                } else {
                    replies::GENERIC_APOLOGY
                };
                self.sender
                    .send_text(&message.from, message.channel, apology)
                    .await;
                Err(e)
            }
        }
    }

    async fn process(&self, message: &StandardizedMessage) -> Result<DispatchOutcome, BizchatError> {
        // Redeliveries must not touch or reopen conversations.
        if self
            .ctx
            .storage
            .message_exists(message.channel, &message.id)
            .await?
        {
            return Ok(self.duplicate(message));
        }

        let business = self
            .ctx
            .resolve_business(message.business_number.as_deref())
            .await?;
        let conversation = self
            .resolver
            .find_or_create(
                &business.id,
                &message.from,
                message.sender_name.as_deref(),
                message.channel,
            )
            .await?;

        let stored = NewMessage::inbound(&conversation, message);
        if let AppendOutcome::Duplicate = self.ctx.storage.append_message(&stored).await? {
            // Lost a race with a concurrent delivery of the same message.
            return Ok(self.duplicate(message));
        }

        if let Ok(adapter) = self.ctx.channels.get(message.channel).await {
            adapter.mark_read(&message.id).await;
        }

        let route = self.ctx.router.route(message);
        debug!(message_id = %message.id, route = route.name(), "message routed");

        let inbound = Inbound {
            message,
            conversation: &conversation,
            business: &business,
        };
        let replies = match handlers::handle(&self.ctx, &route, inbound).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!(
                    message_id = %message.id,
                    route = route.name(),
                    error = %e,
                    "handler failed"
                );
                self.record_failure(message, &e);
                let apology = if e.is_payment() {
                    replies::PAYMENT_APOLOGY
                } else {
                    replies::GENERIC_APOLOGY
                };
                vec![Reply::text(apology)]
            }
        };

        let mut replies_sent = 0;
        for reply in &replies {
            if self
                .sender
                .send(&message.from, message.channel, reply)
                .await
                .is_success()
            {
                replies_sent += 1;
            }
        }

        metrics::counter!(
            "bizchat_messages_processed_total",
            "channel" => message.channel.to_string(),
            "route" => route.name()
        )
        .increment(1);

        Ok(DispatchOutcome::Handled {
            conversation_id: conversation.id,
            route: route.name(),
            replies_sent,
        })
    }

    fn duplicate(&self, message: &StandardizedMessage) -> DispatchOutcome {
        info!(
            message_id = %message.id,
            channel = %message.channel,
            "duplicate delivery ignored"
        );
        DispatchOutcome::Duplicate
    }

    fn record_failure(&self, message: &StandardizedMessage, error: &BizchatError) {
        record_detached(
            &self.ctx.audit,
            AuditEvent::new("message_processing_error", "message")
                .resource(message.id.clone())
                .metadata(serde_json::json!({
                    "channel": message.channel.to_string(),
                    "error": error.to_string(),
                })),
        );
    }

    /// Apply a payment provider callback and tell the customer the outcome.
    ///
    /// Replayed callbacks send nothing unless they issued the invoice.
    pub async fn handle_payment_callback(
        &self,
        callback: &PaymentCallback,
    ) -> Result<CallbackOutcome, BizchatError> {
        let outcome = self.ctx.payments.handle_callback(callback).await?;
        if !outcome.change.applied && outcome.invoice.is_none() {
            return Ok(outcome);
        }

        let transaction = &outcome.change.transaction;
        let Some(conversation_id) = &transaction.conversation_id else {
            debug!(transaction_id = %transaction.id, "transaction has no conversation, no notification");
            return Ok(outcome);
        };
        let Some(conversation) = self.ctx.storage.get_conversation(conversation_id).await? else {
            warn!(transaction_id = %transaction.id, "conversation for transaction is gone");
            return Ok(outcome);
        };
        let business_name = self
            .ctx
            .storage
            .get_business(&transaction.business_id)
            .await?
            .map(|b| b.name)
            .unwrap_or_else(|| self.ctx.config.business.default_business_name.clone());

        if matches!(
            transaction.status,
            TransactionStatus::Completed | TransactionStatus::Failed
        ) {
            let text = replies::payment_status(
                &transaction.amount,
                &business_name,
                transaction.status,
                &transaction.id,
                outcome.invoice.as_ref().map(|i| i.invoice_number.as_str()),
            );
            self.sender
                .send_text(&transaction.customer_phone, conversation.channel, &text)
                .await;
        }
        Ok(outcome)
    }
}
