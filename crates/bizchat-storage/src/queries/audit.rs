// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit log queries.

use bizchat_core::BizchatError;
use bizchat_core::types::AuditEvent;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

pub async fn insert_event(db: &Database, event: &AuditEvent) -> Result<(), BizchatError> {
    let metadata = if event.metadata.is_null() {
        None
    } else {
        Some(event.metadata.to_string())
    };
    let e = event.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO audit_log (action, resource_type, resource_id, metadata)
                 VALUES (?1, ?2, ?3, ?4)",
                params![e.action, e.resource_type, e.resource_id, metadata],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent events for an action, newest first.
pub async fn list_events(
    db: &Database,
    action: &str,
    limit: i64,
) -> Result<Vec<AuditEvent>, BizchatError> {
    let action = action.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT action, resource_type, resource_id, metadata FROM audit_log
                 WHERE action = ?1 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![action, limit], |row| {
                let metadata: Option<String> = row.get(3)?;
                Ok(AuditEvent {
                    action: row.get(0)?,
                    resource_type: row.get(1)?,
                    resource_id: row.get(2)?,
                    metadata: metadata
                        .and_then(|m| serde_json::from_str(&m).ok())
                        .unwrap_or(serde_json::Value::Null),
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
