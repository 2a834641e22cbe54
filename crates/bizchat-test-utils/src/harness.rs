// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full message pipeline over a temp SQLite
//! database, mock WhatsApp and SMS channels, an in-memory audit sink and
//! the standard payment wiring. Provides `send_text()` to drive one
//! inbound message through the dispatcher.

use std::collections::BTreeMap;
use std::sync::Arc;

use bizchat_agent::{AppContext, ChannelRegistry, DispatchOutcome, MessageDispatcher};
use bizchat_config::model::BizchatConfig;
use bizchat_core::payment::{Money, PaymentMethod, PaymentRegion};
use bizchat_core::types::{ChannelType, MessagePayload, Product, StandardizedMessage};
use bizchat_core::{BizchatError, PaymentAdapter, StorageAdapter};
use bizchat_storage::SqliteStorage;

use crate::audit::MemoryAuditSink;
use crate::mock_channel::MockChannel;

type ConfigTweak = Box<dyn FnOnce(&mut BizchatConfig) + Send>;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    upi_id: Option<String>,
    products: Vec<(String, i64)>,
    adapters: Vec<(PaymentRegion, PaymentMethod, Arc<dyn PaymentAdapter>)>,
    tweaks: Vec<ConfigTweak>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            upi_id: Some("shop@okbank".to_string()),
            products: Vec::new(),
            adapters: Vec::new(),
            tweaks: Vec::new(),
        }
    }

    /// UPI payee of the default business. `None` disables QR payments.
    pub fn with_upi_id(mut self, upi_id: Option<&str>) -> Self {
        self.upi_id = upi_id.map(str::to_string);
        self
    }

    /// Seed the default business catalogue (prices in major units).
    pub fn with_product(mut self, name: &str, price: i64) -> Self {
        self.products.push((name.to_string(), price));
        self
    }

    /// Register an extra payment adapter, replacing any default for the key.
    pub fn with_payment_adapter(
        mut self,
        region: PaymentRegion,
        method: PaymentMethod,
        adapter: Arc<dyn PaymentAdapter>,
    ) -> Self {
        self.adapters.push((region, method, adapter));
        self
    }

    /// Adjust the configuration before anything is built from it.
    pub fn with_config(mut self, tweak: impl FnOnce(&mut BizchatConfig) + Send + 'static) -> Self {
        self.tweaks.push(Box::new(tweak));
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, BizchatError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| BizchatError::Storage { source: e.into() })?;

        let mut config = BizchatConfig::default();
        config.storage.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        config.business.default_upi_id = self.upi_id;
        config.server.public_url = Some("https://bizchat.test".to_string());
        for tweak in self.tweaks {
            tweak(&mut config);
        }

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let audit = Arc::new(MemoryAuditSink::new());

        let whatsapp = Arc::new(MockChannel::new(ChannelType::WhatsApp));
        let sms = Arc::new(MockChannel::new(ChannelType::Sms));
        let mut channels = ChannelRegistry::new();
        channels.register(whatsapp.clone());
        channels.register(sms.clone());

        let mut payments = bizchat_payment::default_bridge(&config, storage.clone(), audit.clone())?;
        for (region, method, adapter) in self.adapters {
            payments = payments.register(region, method, adapter);
        }

        let ctx = Arc::new(AppContext::new(
            config,
            storage.clone(),
            channels,
            payments,
            audit.clone(),
        ));
        let business = ctx.ensure_default_business().await?;
        let currency = ctx.config.payment.currency.clone();
        for (i, (name, price)) in self.products.into_iter().enumerate() {
            storage
                .upsert_product(&Product {
                    id: format!("prod-{}", i + 1),
                    business_id: business.id.clone(),
                    name,
                    price: Money::from_major(price, currency.clone()),
                })
                .await?;
        }

        Ok(TestHarness {
            dispatcher: MessageDispatcher::new(ctx.clone()),
            ctx,
            storage,
            audit,
            whatsapp,
            sms,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock channels and temp storage.
pub struct TestHarness {
    pub ctx: Arc<AppContext>,
    pub dispatcher: MessageDispatcher,
    pub storage: Arc<dyn StorageAdapter>,
    pub audit: Arc<MemoryAuditSink>,
    pub whatsapp: Arc<MockChannel>,
    pub sms: Arc<MockChannel>,
    // Held to keep the database file alive for the harness lifetime.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn channel(&self, channel: ChannelType) -> &Arc<MockChannel> {
        match channel {
            ChannelType::Sms => &self.sms,
            _ => &self.whatsapp,
        }
    }

    /// Dispatch a text message from `from` on `channel`.
    pub async fn send_text(
        &self,
        channel: ChannelType,
        from: &str,
        body: &str,
    ) -> Result<DispatchOutcome, BizchatError> {
        self.dispatcher
            .dispatch(text_message(channel, from, body))
            .await
    }

    pub async fn dispatch(
        &self,
        message: StandardizedMessage,
    ) -> Result<DispatchOutcome, BizchatError> {
        self.dispatcher.dispatch(message).await
    }

    /// Let detached audit writes land before asserting on them.
    pub async fn settle(&self) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    pub async fn audit_actions(&self) -> Vec<String> {
        self.settle().await;
        self.audit.actions().await
    }
}

/// A message with a fresh provider id.
pub fn message(channel: ChannelType, from: &str, payload: MessagePayload) -> StandardizedMessage {
    StandardizedMessage {
        id: format!("wamid.{}", uuid::Uuid::new_v4().simple()),
        from: from.to_string(),
        timestamp: chrono::Utc::now(),
        channel,
        payload,
        provider: "mock".to_string(),
        business_number: None,
        sender_name: None,
    }
}

pub fn text_message(channel: ChannelType, from: &str, body: &str) -> StandardizedMessage {
    message(
        channel,
        from,
        MessagePayload::Text {
            body: body.to_string(),
        },
    )
}

pub fn button_message(from: &str, payload: &str, text: &str) -> StandardizedMessage {
    message(
        ChannelType::WhatsApp,
        from,
        MessagePayload::Button {
            payload: payload.to_string(),
            text: text.to_string(),
        },
    )
}

pub fn image_message(from: &str, url: &str) -> StandardizedMessage {
    message(
        ChannelType::WhatsApp,
        from,
        MessagePayload::Image {
            url: Some(url.to_string()),
            caption: None,
        },
    )
}

pub fn template_message(from: &str, name: &str) -> StandardizedMessage {
    message(
        ChannelType::WhatsApp,
        from,
        MessagePayload::Template {
            name: name.to_string(),
            parameters: BTreeMap::new(),
        },
    )
}
