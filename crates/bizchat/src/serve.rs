// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bizchat serve` command implementation.
//!
//! Opens storage, seeds the fallback business, wires the configured
//! channels and payment adapters into one `AppContext`, and runs the
//! webhook gateway until SIGINT/SIGTERM. Acknowledged webhooks still being
//! processed get a bounded window to finish before exit.

use std::sync::Arc;
use std::time::Duration;

use bizchat_agent::{AppContext, MessageDispatcher, shutdown};
use bizchat_config::BizchatConfig;
use bizchat_core::{AuditSink, BizchatError, StorageAdapter};
use bizchat_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use bizchat_storage::{SqliteAuditSink, SqliteStorage};
use tracing::{info, warn};

/// How long in-flight messages may run after shutdown is requested.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_serve(config: BizchatConfig) -> Result<(), BizchatError> {
    init_tracing(&config.server.log_level);

    info!("starting bizchat serve");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let audit: Arc<dyn AuditSink> = Arc::new(SqliteAuditSink::new(storage.db()?.clone()));
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

    let prometheus_render = match bizchat_gateway::install_prometheus() {
        Ok(render) => Some(render),
        Err(e) => {
            warn!(error = %e, "prometheus initialization failed, continuing without metrics");
            None
        }
    };

    let server_config = ServerConfig::from(&config.server);
    let ctx = AppContext::from_config(config, storage.clone(), audit)?;
    let business = ctx.ensure_default_business().await?;
    info!(business_id = %business.id, name = %business.name, "default business ready");

    if ctx.channels.is_empty() {
        warn!("no channels enabled, inbound messages cannot be answered");
    } else {
        let channels: Vec<String> = ctx
            .channels
            .channel_types()
            .iter()
            .map(ToString::to_string)
            .collect();
        info!(channels = ?channels, "channels configured");
    }

    let ctx = Arc::new(ctx);
    let state = GatewayState::new(
        MessageDispatcher::new(ctx.clone()),
        HealthState::new(prometheus_render),
    );

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&server_config, state.clone(), cancel).await;

    shutdown::drain_tasks(&state.tracker, DRAIN_TIMEOUT).await;
    ctx.channels.shutdown().await;
    if let Err(e) = storage.close().await {
        warn!(error = %e, "storage close failed");
    }

    served?;
    info!("bizchat serve shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bizchat={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
