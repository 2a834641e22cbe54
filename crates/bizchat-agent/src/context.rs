// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency container shared by the dispatcher, sender and gateway.

use std::sync::Arc;

use bizchat_config::model::BizchatConfig;
use bizchat_core::types::Business;
use bizchat_core::{AuditSink, BizchatError, StorageAdapter};
use bizchat_payment::PaymentBridge;
use bizchat_router::MessageRouter;
use tracing::info;

use crate::channels::ChannelRegistry;

/// Everything a message needs on its way through the system.
///
/// Built once at startup and shared behind an `Arc`; nothing in here is
/// process-global, so tests can assemble their own.
pub struct AppContext {
    pub config: Arc<BizchatConfig>,
    pub storage: Arc<dyn StorageAdapter>,
    pub channels: ChannelRegistry,
    pub router: MessageRouter,
    pub payments: Arc<PaymentBridge>,
    pub audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("channels", &self.channels)
            .field("router", &self.router)
            .field("payments", &self.payments)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    pub fn new(
        config: BizchatConfig,
        storage: Arc<dyn StorageAdapter>,
        channels: ChannelRegistry,
        payments: PaymentBridge,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let router = MessageRouter::new(&config.routing);
        Self {
            config: Arc::new(config),
            storage,
            channels,
            router,
            payments: Arc::new(payments),
            audit,
        }
    }

    /// Wire the configured channels and the default payment adapters.
    pub fn from_config(
        config: BizchatConfig,
        storage: Arc<dyn StorageAdapter>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, BizchatError> {
        let channels = ChannelRegistry::from_config(&config, storage.clone())?;
        let payments = bizchat_payment::default_bridge(&config, storage.clone(), audit.clone())?;
        Ok(Self::new(config, storage, channels, payments, audit))
    }

    /// Create the fallback business if it does not exist yet.
    pub async fn ensure_default_business(&self) -> Result<Business, BizchatError> {
        let business_cfg = &self.config.business;
        if let Some(existing) = self
            .storage
            .get_business(&business_cfg.default_business_id)
            .await?
        {
            return Ok(existing);
        }
        let business = Business {
            id: business_cfg.default_business_id.clone(),
            name: business_cfg.default_business_name.clone(),
            phone: None,
            upi_id: business_cfg.default_upi_id.clone(),
            gstin: None,
            country: None,
        };
        self.storage.upsert_business(&business).await?;
        info!(business_id = %business.id, "default business created");
        Ok(business)
    }

    /// The business owning `business_number`, else the fallback business.
    pub async fn resolve_business(
        &self,
        business_number: Option<&str>,
    ) -> Result<Business, BizchatError> {
        if let Some(number) = business_number
            && let Some(business) = self.storage.find_business_by_phone(number).await?
        {
            return Ok(business);
        }
        let id = &self.config.business.default_business_id;
        self.storage
            .get_business(id)
            .await?
            .ok_or_else(|| BizchatError::NotFound {
                entity: "business",
                id: id.clone(),
            })
    }
}
