// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Channel, storage and payment adapters extend the [`PluginAdapter`] base
//! trait and use `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod audit;
pub mod channel;
pub mod payment;
pub mod storage;

pub use adapter::PluginAdapter;
pub use audit::{AuditSink, record_detached};
pub use channel::MessageChannel;
pub use payment::PaymentAdapter;
pub use storage::StorageAdapter;
