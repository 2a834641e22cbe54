// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel message templates.

use bizchat_core::BizchatError;
use bizchat_core::types::ChannelType;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

pub async fn get_template(
    db: &Database,
    name: &str,
    channel: ChannelType,
) -> Result<Option<String>, BizchatError> {
    let name = name.to_string();
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT content FROM message_templates WHERE name = ?1 AND channel_type = ?2",
                params![name, channel],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_template(
    db: &Database,
    name: &str,
    channel: ChannelType,
    content: &str,
) -> Result<(), BizchatError> {
    let name = name.to_string();
    let channel = channel.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_templates (name, channel_type, content)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(name, channel_type) DO UPDATE SET
                    content = excluded.content,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![name, channel, content],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
