// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process shutdown: a signal-driven cancellation token for the gateway,
//! and a bounded drain of messages still being dispatched after their
//! webhook was acknowledged.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Spawn a watcher that cancels the returned token on Ctrl+C or, on Unix,
/// SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "shutdown requested");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "SIGTERM unavailable, only Ctrl+C stops the server");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}

/// Waits up to `timeout` for in-flight message processing to finish.
pub async fn drain_tasks(tracker: &TaskTracker, timeout: Duration) {
    tracker.close();
    if tracker.is_empty() {
        info!("no in-flight messages to drain");
        return;
    }

    info!(count = tracker.len(), "waiting for in-flight messages to complete");
    if tokio::time::timeout(timeout, tracker.wait()).await.is_ok() {
        info!("all in-flight messages drained");
    } else {
        warn!(
            remaining = tracker.len(),
            "timeout reached, some messages interrupted"
        );
    }
}
