// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bizchat message router.
//!
//! This crate provides the trait definitions, error types, and common types
//! used throughout the Bizchat workspace: the channel-agnostic
//! [`StandardizedMessage`], the provider webhook sum type, and the adapter
//! traits every channel, storage and payment backend implements.

pub mod error;
pub mod payment;
pub mod phone;
pub mod template;
pub mod time;
pub mod traits;
pub mod types;
pub mod webhook;

// Re-export key items at crate root for ergonomic imports.
pub use error::BizchatError;
pub use types::{
    AdapterType, ChannelType, HealthStatus, MessageKind, MessagePayload, SendResult,
    StandardizedMessage,
};
pub use webhook::WebhookPayload;

// Re-export all adapter traits at crate root.
pub use traits::{
    AuditSink, MessageChannel, PaymentAdapter, PluginAdapter, StorageAdapter, record_detached,
};
