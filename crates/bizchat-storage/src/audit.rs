// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink persisting events into the `audit_log` table.

use async_trait::async_trait;
use bizchat_core::types::AuditEvent;
use bizchat_core::{AuditSink, BizchatError};

use crate::database::Database;
use crate::queries;

/// Writes audit events through the shared database connection.
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    db: Database,
}

impl SqliteAuditSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), BizchatError> {
        queries::audit::insert_event(&self.db, &event).await
    }
}
