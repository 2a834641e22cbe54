// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation queries.
//!
//! The partial unique index `idx_conversations_active` allows only one
//! active row per (business, customer, channel). [`insert_conversation`]
//! reports a lost race instead of failing so callers can re-fetch the winner.

use bizchat_core::BizchatError;
use bizchat_core::time::now_iso;
use bizchat_core::types::{ChannelType, Conversation, ConversationStatus};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{CONVERSATION_COLUMNS, conversation_from_row};

pub async fn find_active_conversation(
    db: &Database,
    business_id: &str,
    customer_phone: &str,
    channel: ChannelType,
) -> Result<Option<Conversation>, BizchatError> {
    let business_id = business_id.to_string();
    let customer_phone = customer_phone.to_string();
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE business_id = ?1 AND customer_phone = ?2 AND channel_type = ?3
                       AND status = 'active'
                     ORDER BY last_message_at DESC LIMIT 1"
                ),
                params![business_id, customer_phone, channel],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Most recently active conversation for a contact, regardless of business.
pub async fn find_latest_active_conversation(
    db: &Database,
    customer_phone: &str,
    channel: ChannelType,
) -> Result<Option<Conversation>, BizchatError> {
    let customer_phone = customer_phone.to_string();
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS} FROM conversations
                     WHERE customer_phone = ?1 AND channel_type = ?2 AND status = 'active'
                     ORDER BY last_message_at DESC LIMIT 1"
                ),
                params![customer_phone, channel],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Returns `false` if an active conversation for the tuple already exists.
pub async fn insert_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<bool, BizchatError> {
    let c = conversation.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO conversations
                    (id, business_id, customer_phone, customer_name, channel_type, status,
                     last_message_at, last_message_preview, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    c.id,
                    c.business_id,
                    c.customer_phone,
                    c.customer_name,
                    c.channel.to_string(),
                    c.status.to_string(),
                    c.last_message_at,
                    c.last_message_preview,
                    c.created_at,
                ],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn touch_conversation(db: &Database, id: &str) -> Result<(), BizchatError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET last_message_at = ?1 WHERE id = ?2",
                params![now_iso(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, BizchatError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
                conversation_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Conversations for a business, most recently active first.
pub async fn list_conversations(
    db: &Database,
    business_id: &str,
    status: Option<ConversationStatus>,
) -> Result<Vec<Conversation>, BizchatError> {
    let business_id = business_id.to_string();
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE business_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY last_message_at DESC"
            ))?;
            let rows = stmt.query_map(params![business_id, status], conversation_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn close_conversation(db: &Database, id: &str) -> Result<(), BizchatError> {
    let key = id.to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET status = 'closed' WHERE id = ?1",
                params![key],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated == 0 {
        return Err(BizchatError::NotFound {
            entity: "conversation",
            id: id.to_string(),
        });
    }
    Ok(())
}
