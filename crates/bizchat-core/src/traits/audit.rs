// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fire-and-forget audit sink.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BizchatError;
use crate::types::AuditEvent;

#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn record(&self, event: AuditEvent) -> Result<(), BizchatError>;
}

/// Record an event on a background task. Failures are logged and dropped.
pub fn record_detached(sink: &Arc<dyn AuditSink>, event: AuditEvent) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        let action = event.action.clone();
        if let Err(e) = sink.record(event).await {
            tracing::warn!(action = %action, error = %e, "audit event dropped");
        }
    });
}
