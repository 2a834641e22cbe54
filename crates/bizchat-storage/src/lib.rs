// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Bizchat message router.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and typed queries for businesses,
//! conversations, messages, payment transactions, invoices, templates and
//! the audit log.
//!
//! Uniqueness guarantees (one active conversation per contact, one message
//! per provider id, one invoice per transaction) are enforced by the schema,
//! so they hold across concurrent webhook deliveries.

pub mod adapter;
pub mod audit;
pub mod database;
pub mod migrations;
mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use audit::SqliteAuditSink;
pub use database::Database;
