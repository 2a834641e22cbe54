// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Find-or-create for the active conversation of a customer.
//!
//! Uniqueness is enforced by the store: an insert that loses the race for
//! a `(business, customer, channel)` tuple reports a conflict, and the
//! resolver re-fetches the winner instead of creating a second row.

use std::sync::Arc;

use bizchat_core::time::now_iso;
use bizchat_core::types::{ChannelType, Conversation, ConversationStatus};
use bizchat_core::{BizchatError, StorageAdapter};
use tracing::{debug, info};

/// Attempts before giving up when the winning row vanishes between the
/// conflicting insert and the re-fetch.
const MAX_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct ConversationResolver {
    storage: Arc<dyn StorageAdapter>,
}

impl ConversationResolver {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    pub async fn find_or_create(
        &self,
        business_id: &str,
        customer_phone: &str,
        customer_name: Option<&str>,
        channel: ChannelType,
    ) -> Result<Conversation, BizchatError> {
        for _ in 0..MAX_ATTEMPTS {
            if let Some(existing) = self
                .storage
                .find_active_conversation(business_id, customer_phone, channel)
                .await?
            {
                self.storage.touch_conversation(&existing.id).await?;
                debug!(conversation_id = %existing.id, "resumed active conversation");
                return Ok(existing);
            }

            let now = now_iso();
            let conversation = Conversation {
                id: uuid::Uuid::new_v4().to_string(),
                business_id: business_id.to_string(),
                customer_phone: customer_phone.to_string(),
                customer_name: customer_name.map(str::to_string),
                channel,
                status: ConversationStatus::Active,
                last_message_at: now.clone(),
                last_message_preview: None,
                created_at: now,
            };
            if self.storage.insert_conversation(&conversation).await? {
                info!(
                    conversation_id = %conversation.id,
                    business_id,
                    %channel,
                    "conversation created"
                );
                return Ok(conversation);
            }
            debug!(business_id, %channel, "lost conversation insert race, re-fetching");
        }

        Err(BizchatError::Internal(format!(
            "could not resolve an active conversation for {customer_phone} on {channel}"
        )))
    }
}
