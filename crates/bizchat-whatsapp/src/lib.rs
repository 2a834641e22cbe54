// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel adapter for the Bizchat message router.
//!
//! Implements [`MessageChannel`] over the Graph API: text, template and
//! media sends, webhook normalization, read receipts, and the signature and
//! subscription checks the gateway runs before accepting a webhook.

pub mod api;
pub mod inbound;
pub mod verify;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bizchat_config::model::WhatsAppConfig;
use bizchat_core::phone::without_plus;
use bizchat_core::template::render_template;
use bizchat_core::types::{
    AdapterType, ChannelType, HealthStatus, OutboundMedia, SendResult, StandardizedMessage,
};
use bizchat_core::{BizchatError, MessageChannel, PluginAdapter, StorageAdapter, WebhookPayload};
use tracing::{debug, info, warn};

use crate::api::GraphClient;
use crate::inbound::MediaBase;

pub use verify::{verify_signature, verify_subscription};

/// Language code for native templates.
const TEMPLATE_LANGUAGE: &str = "en_US";

/// WhatsApp channel backed by the Cloud API.
pub struct WhatsAppCloudChannel {
    config: WhatsAppConfig,
    client: Option<GraphClient>,
    media: MediaBase,
    templates: Option<Arc<dyn StorageAdapter>>,
    initialized: AtomicBool,
}

impl WhatsAppCloudChannel {
    /// Build the adapter. Missing credentials are reported by
    /// [`MessageChannel::initialize`], not here, so inbound normalization
    /// works even when sending is not configured.
    pub fn new(config: WhatsAppConfig) -> Result<Self, BizchatError> {
        let client = match (
            non_empty(&config.phone_number_id),
            non_empty(&config.access_token),
        ) {
            (Some(phone_id), Some(token)) => Some(GraphClient::new(
                &config.api_base,
                &config.api_version,
                phone_id,
                token,
            )?),
            _ => None,
        };
        let media = MediaBase {
            api_base: config.api_base.clone(),
            api_version: config.api_version.clone(),
        };
        Ok(Self {
            config,
            client,
            media,
            templates: None,
            initialized: AtomicBool::new(false),
        })
    }

    /// Look up `send_template` names in the template store first.
    pub fn with_templates(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.templates = Some(storage);
        self
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    async fn post(&self, body: serde_json::Value) -> SendResult {
        let Some(client) = &self.client else {
            return SendResult::failed("WhatsApp credentials are not configured");
        };
        match client.post_message(&body).await {
            Ok(id) => SendResult::Sent { message_id: id },
            Err(e) => SendResult::failed(e.to_string()),
        }
    }

    async fn local_template(&self, name: &str) -> Option<String> {
        let storage = self.templates.as_ref()?;
        match storage.get_template(name, ChannelType::WhatsApp).await {
            Ok(found) => found,
            Err(e) => {
                warn!(template = name, error = %e, "template lookup failed, using native template");
                None
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl PluginAdapter for WhatsAppCloudChannel {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        if self.client.is_some() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(
                "WhatsApp credentials are not configured".into(),
            ))
        }
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        debug!("WhatsApp Cloud channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for WhatsAppCloudChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::WhatsApp
    }

    async fn initialize(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }
        if self.client.is_none() {
            warn!("whatsapp.phone_number_id and whatsapp.access_token are required to send");
            return false;
        }
        if !self.initialized.swap(true, Ordering::AcqRel) {
            info!(api_version = %self.config.api_version, "WhatsApp Cloud channel initialized");
        }
        true
    }

    async fn send_text(&self, to: &str, text: &str) -> SendResult {
        self.post(api::text_body(without_plus(to), text)).await
    }

    async fn send_template(
        &self,
        to: &str,
        template: &str,
        params: &BTreeMap<String, String>,
    ) -> SendResult {
        if let Some(content) = self.local_template(template).await {
            let rendered = render_template(&content, params);
            return self.send_text(to, &rendered).await;
        }
        let values: Vec<&str> = params.values().map(String::as_str).collect();
        self.post(api::template_body(
            without_plus(to),
            template,
            TEMPLATE_LANGUAGE,
            &values,
        ))
        .await
    }

    async fn send_media(&self, to: &str, media: &OutboundMedia) -> SendResult {
        let to = without_plus(to);
        let body = match media {
            OutboundMedia::Image { url, caption } => api::image_body(to, url, caption.as_deref()),
            OutboundMedia::Document {
                url,
                filename,
                caption,
            } => api::document_body(to, url, filename.as_deref(), caption.as_deref()),
        };
        self.post(body).await
    }

    async fn mark_read(&self, message_id: &str) {
        if !self.config.mark_as_read {
            return;
        }
        let result = self.post(api::read_receipt_body(message_id)).await;
        if let Some(error) = result.error() {
            debug!(message_id, error, "failed to send read receipt");
        }
    }

    fn process_incoming(
        &self,
        payload: &WebhookPayload,
    ) -> Result<Vec<StandardizedMessage>, BizchatError> {
        match payload {
            WebhookPayload::WhatsApp(p) => inbound::normalize(p, &self.media),
            other => Err(BizchatError::InvalidPayload(format!(
                "WhatsApp Cloud channel cannot process {} payloads",
                other.provider()
            ))),
        }
    }
}
