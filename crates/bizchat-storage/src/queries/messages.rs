// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log queries.

use bizchat_core::BizchatError;
use bizchat_core::time::now_iso;
use bizchat_core::types::{AppendOutcome, ChannelType, Message, NewMessage};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, message_from_row};

/// Preview length stored on the conversation, in characters.
const PREVIEW_CHARS: usize = 100;

/// Append a message and bump the owning conversation in one transaction.
///
/// A repeated `(channel, provider_message_id)` leaves both tables untouched
/// and yields [`AppendOutcome::Duplicate`].
pub async fn append_message(
    db: &Database,
    message: &NewMessage,
) -> Result<AppendOutcome, BizchatError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let stored = Message {
                id: uuid::Uuid::new_v4().to_string(),
                conversation_id: m.conversation_id,
                channel: m.channel,
                sender: m.sender,
                kind: m.kind,
                content: m.content,
                media_url: m.media_url,
                provider_message_id: m.provider_message_id,
                delivery_status: m.delivery_status,
                created_at: now_iso(),
            };

            let inserted = tx.execute(
                "INSERT INTO messages
                    (id, conversation_id, channel_type, sender_type, message_type, content,
                     media_url, provider_message_id, delivery_status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(channel_type, provider_message_id)
                    WHERE provider_message_id IS NOT NULL DO NOTHING",
                params![
                    stored.id,
                    stored.conversation_id,
                    stored.channel.to_string(),
                    stored.sender.to_string(),
                    stored.kind.to_string(),
                    stored.content,
                    stored.media_url,
                    stored.provider_message_id,
                    stored.delivery_status.to_string(),
                    stored.created_at,
                ],
            )?;
            if inserted == 0 {
                return Ok(AppendOutcome::Duplicate);
            }

            let preview: String = stored.content.chars().take(PREVIEW_CHARS).collect();
            tx.execute(
                "UPDATE conversations SET last_message_at = ?1, last_message_preview = ?2
                 WHERE id = ?3",
                params![stored.created_at, preview, stored.conversation_id],
            )?;
            tx.commit()?;
            Ok(AppendOutcome::Inserted(stored))
        })
        .await
        .map_err(map_tr_err)
}

/// Whether a message with this provider id was already stored on `channel`.
pub async fn message_exists(
    db: &Database,
    channel: ChannelType,
    provider_message_id: &str,
) -> Result<bool, BizchatError> {
    let channel = channel.to_string();
    let provider_message_id = provider_message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM messages
                 WHERE channel_type = ?1 AND provider_message_id = ?2)",
                params![channel, provider_message_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent `limit` messages (all when `None`), oldest first.
pub async fn get_messages(
    db: &Database,
    conversation_id: &str,
    limit: Option<i64>,
) -> Result<Vec<Message>, BizchatError> {
    let conversation_id = conversation_id.to_string();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM (
                    SELECT *, rowid AS seq FROM messages WHERE conversation_id = ?1
                    ORDER BY created_at DESC, seq DESC LIMIT ?2
                 ) ORDER BY created_at ASC, seq ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id, limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use bizchat_core::types::{DeliveryStatus, MessageKind, SenderRole};

    use super::*;
    use crate::queries::conversations::{get_conversation, insert_conversation};
    use crate::queries::test_support::{conversation, db};

    fn inbound(conversation_id: &str, provider_id: &str, content: &str) -> NewMessage {
        NewMessage {
            conversation_id: conversation_id.into(),
            channel: ChannelType::WhatsApp,
            sender: SenderRole::Customer,
            kind: MessageKind::Text,
            content: content.into(),
            media_url: None,
            provider_message_id: Some(provider_id.into()),
            delivery_status: DeliveryStatus::Received,
        }
    }

    #[tokio::test]
    async fn append_updates_conversation_preview() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();

        let outcome = append_message(&db, &inbound("c1", "wamid.1", "hello there"))
            .await
            .unwrap();
        let AppendOutcome::Inserted(stored) = outcome else {
            panic!("expected insert");
        };

        let conv = get_conversation(&db, "c1").await.unwrap().unwrap();
        assert_eq!(conv.last_message_preview.as_deref(), Some("hello there"));
        assert_eq!(conv.last_message_at, stored.created_at);
    }

    #[tokio::test]
    async fn duplicate_provider_id_is_ignored() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();

        append_message(&db, &inbound("c1", "wamid.1", "first"))
            .await
            .unwrap();
        let again = append_message(&db, &inbound("c1", "wamid.1", "second"))
            .await
            .unwrap();
        assert_eq!(again, AppendOutcome::Duplicate);

        let messages = get_messages(&db, "c1", None).await.unwrap();
        assert_eq!(messages.len(), 1);
        let conv = get_conversation(&db, "c1").await.unwrap().unwrap();
        assert_eq!(conv.last_message_preview.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn message_exists_is_scoped_by_channel() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();
        assert!(!message_exists(&db, ChannelType::WhatsApp, "wamid.1").await.unwrap());
        append_message(&db, &inbound("c1", "wamid.1", "hi")).await.unwrap();
        assert!(message_exists(&db, ChannelType::WhatsApp, "wamid.1").await.unwrap());
        assert!(!message_exists(&db, ChannelType::Sms, "wamid.1").await.unwrap());
    }

    #[tokio::test]
    async fn constraint_violation_is_an_error_not_a_duplicate() {
        let db = db().await;
        let orphan = inbound("no-such-conversation", "wamid.1", "hi");
        let result = append_message(&db, &orphan).await;
        assert!(
            result.is_err(),
            "foreign key failure must surface, got {result:?}"
        );
    }

    #[tokio::test]
    async fn same_provider_id_on_other_channel_is_distinct() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();
        append_message(&db, &inbound("c1", "id-1", "a")).await.unwrap();
        let mut sms = inbound("c1", "id-1", "b");
        sms.channel = ChannelType::Sms;
        let outcome = append_message(&db, &sms).await.unwrap();
        assert!(matches!(outcome, AppendOutcome::Inserted(_)));
    }

    #[tokio::test]
    async fn messages_without_provider_id_never_collide() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();
        for text in ["one", "two"] {
            let mut msg = inbound("c1", "x", text);
            msg.provider_message_id = None;
            append_message(&db, &msg).await.unwrap();
        }
        assert_eq!(get_messages(&db, "c1", None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn limit_returns_latest_in_order() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            append_message(&db, &inbound("c1", &format!("id-{i}"), text))
                .await
                .unwrap();
        }
        let latest = get_messages(&db, "c1", Some(2)).await.unwrap();
        let contents: Vec<_> = latest.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "three"]);
    }

    #[tokio::test]
    async fn preview_is_truncated() {
        let db = db().await;
        insert_conversation(&db, &conversation("c1", "biz-1", "+911"))
            .await
            .unwrap();
        let long = "x".repeat(250);
        append_message(&db, &inbound("c1", "id", &long)).await.unwrap();
        let conv = get_conversation(&db, "c1").await.unwrap().unwrap();
        assert_eq!(conv.last_message_preview.unwrap().len(), PREVIEW_CHARS);
    }
}
