// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory audit sink.

use async_trait::async_trait;
use tokio::sync::Mutex;

use bizchat_core::types::AuditEvent;
use bizchat_core::{AuditSink, BizchatError};

/// Collects audit events so tests can assert on them.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    pub async fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    /// Events with the given action, in arrival order.
    pub async fn find(&self, action: &str) -> Vec<AuditEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), BizchatError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
