// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry of the configured channel adapters, one per channel type.
//!
//! Adapters are initialized lazily on first use; `initialize` is idempotent
//! on every adapter so repeated lookups are cheap.

use std::collections::HashMap;
use std::sync::Arc;

use bizchat_config::model::{BizchatConfig, SmsProvider, WhatsAppProvider};
use bizchat_core::phone::is_whatsapp_address;
use bizchat_core::types::{ChannelType, HealthStatus, StandardizedMessage};
use bizchat_core::{BizchatError, MessageChannel, StorageAdapter, WebhookPayload};
use bizchat_sms::{Msg91Channel, TwilioChannel};
use bizchat_whatsapp::WhatsAppCloudChannel;
use tracing::{info, warn};

#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelType, Arc<dyn MessageChannel>>,
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self
            .channels
            .iter()
            .map(|(channel, adapter)| format!("{channel}={}", adapter.name()))
            .collect();
        names.sort();
        f.debug_struct("ChannelRegistry")
            .field("channels", &names)
            .finish()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every enabled channel in `config`.
    pub fn from_config(
        config: &BizchatConfig,
        templates: Arc<dyn StorageAdapter>,
    ) -> Result<Self, BizchatError> {
        let mut registry = Self::new();

        if config.whatsapp.enabled {
            let channel: Arc<dyn MessageChannel> = match config.whatsapp.provider {
                WhatsAppProvider::Cloud => Arc::new(
                    WhatsAppCloudChannel::new(config.whatsapp.clone())?
                        .with_templates(templates.clone()),
                ),
                WhatsAppProvider::Twilio => Arc::new(
                    TwilioChannel::whatsapp(&config.twilio)?.with_templates(templates.clone()),
                ),
            };
            registry.register(channel);
        }

        if config.sms.enabled {
            let channel: Arc<dyn MessageChannel> = match config.sms.provider {
                SmsProvider::Msg91 => {
                    Arc::new(Msg91Channel::new(&config.sms)?.with_templates(templates.clone()))
                }
                SmsProvider::Twilio => {
                    Arc::new(TwilioChannel::sms(&config.twilio)?.with_templates(templates))
                }
            };
            registry.register(channel);
        }

        if registry.is_empty() {
            warn!("no messaging channels enabled, inbound messages will not be answered");
        }
        Ok(registry)
    }

    /// Register an adapter under its own channel type, replacing any previous one.
    pub fn register(&mut self, channel: Arc<dyn MessageChannel>) {
        let channel_type = channel.channel_type();
        info!(channel = %channel_type, adapter = channel.name(), "channel registered");
        self.channels.insert(channel_type, channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        let mut types: Vec<ChannelType> = self.channels.keys().copied().collect();
        types.sort_by_key(|c| c.to_string());
        types
    }

    /// The adapter for `channel`, initialized.
    pub async fn get(&self, channel: ChannelType) -> Result<Arc<dyn MessageChannel>, BizchatError> {
        let adapter = self
            .channels
            .get(&channel)
            .cloned()
            .ok_or_else(|| BizchatError::AdapterNotFound {
                adapter_type: "channel".into(),
                name: channel.to_string(),
            })?;
        if !adapter.initialize().await {
            return Err(BizchatError::channel(format!(
                "{} adapter failed to initialize",
                adapter.name()
            )));
        }
        Ok(adapter)
    }

    /// Normalize a webhook payload with the adapter responsible for it.
    ///
    /// Twilio posts both channels to one endpoint, so the sender address
    /// picks the adapter.
    pub fn process_incoming(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Vec<StandardizedMessage>, BizchatError> {
        let channel = match payload {
            WebhookPayload::WhatsApp(_) => ChannelType::WhatsApp,
            WebhookPayload::Twilio(p) if is_whatsapp_address(&p.from) => ChannelType::WhatsApp,
            WebhookPayload::Twilio(_) | WebhookPayload::Sms(_) | WebhookPayload::Sns(_) => {
                ChannelType::Sms
            }
        };
        let adapter = self
            .channels
            .get(&channel)
            .ok_or_else(|| BizchatError::AdapterNotFound {
                adapter_type: "channel".into(),
                name: channel.to_string(),
            })?;
        adapter.process_incoming(payload)
    }

    /// Worst status across all adapters.
    pub async fn health(&self) -> HealthStatus {
        let mut unhealthy = false;
        let mut reasons = Vec::new();
        for channel in self.channel_types() {
            let Some(adapter) = self.channels.get(&channel) else {
                continue;
            };
            match adapter.health_check().await {
                Ok(HealthStatus::Healthy) => {}
                Ok(HealthStatus::Degraded(reason)) => reasons.push(format!("{channel}: {reason}")),
                Ok(HealthStatus::Unhealthy(reason)) => {
                    unhealthy = true;
                    reasons.push(format!("{channel}: {reason}"));
                }
                Err(e) => {
                    unhealthy = true;
                    reasons.push(format!("{channel}: {e}"));
                }
            }
        }
        match (unhealthy, reasons.is_empty()) {
            (_, true) => HealthStatus::Healthy,
            (true, false) => HealthStatus::Unhealthy(reasons.join("; ")),
            (false, false) => HealthStatus::Degraded(reasons.join("; ")),
        }
    }

    pub async fn shutdown(&self) {
        for (channel, adapter) in &self.channels {
            if let Err(e) = adapter.shutdown().await {
                warn!(%channel, error = %e, "channel shutdown error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizchat_test_utils::MockChannel;

    #[tokio::test]
    async fn get_initializes_registered_channel() {
        let mock = Arc::new(MockChannel::new(ChannelType::Sms));
        let mut registry = ChannelRegistry::new();
        registry.register(mock.clone());

        assert!(!mock.is_initialized());
        registry.get(ChannelType::Sms).await.unwrap();
        assert!(mock.is_initialized());

        let err = registry.get(ChannelType::WhatsApp).await.err().unwrap();
        assert!(matches!(err, BizchatError::AdapterNotFound { .. }));
    }

    #[tokio::test]
    async fn health_reports_degraded_adapters() {
        let healthy = Arc::new(MockChannel::new(ChannelType::WhatsApp));
        let degraded = Arc::new(MockChannel::new(ChannelType::Sms));
        degraded.set_failing(true);
        let mut registry = ChannelRegistry::new();
        registry.register(healthy);
        registry.register(degraded);

        match registry.health().await {
            HealthStatus::Degraded(reason) => assert!(reason.starts_with("sms:")),
            other => panic!("expected degraded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn from_config_builds_enabled_channels() {
        let db = bizchat_storage::Database::open_in_memory().await.unwrap();
        let storage: Arc<dyn StorageAdapter> = Arc::new(bizchat_storage::SqliteStorage::from_database(
            Default::default(),
            db,
        ));

        let mut config = BizchatConfig::default();
        assert!(ChannelRegistry::from_config(&config, storage.clone()).unwrap().is_empty());

        config.sms.enabled = true;
        config.sms.msg91_auth_key = Some("key".into());
        config.sms.msg91_flow_id = Some("flow".into());
        config.whatsapp.enabled = true;
        config.whatsapp.phone_number_id = Some("pn-1".into());
        config.whatsapp.access_token = Some("token".into());
        let registry = ChannelRegistry::from_config(&config, storage).unwrap();
        assert_eq!(
            registry.channel_types(),
            vec![ChannelType::Sms, ChannelType::WhatsApp]
        );
    }

    #[test]
    fn twilio_payload_is_routed_by_sender_prefix() {
        let registry = ChannelRegistry::new();
        let payload = WebhookPayload::twilio_from_form(
            b"From=whatsapp%3A%2B919876543210&Body=hi&MessageSid=SM1",
        )
        .unwrap();
        let err = registry.process_incoming(&payload).unwrap_err();
        match err {
            BizchatError::AdapterNotFound { name, .. } => assert_eq!(name, "whatsapp"),
            other => panic!("unexpected error {other}"),
        }
    }
}
