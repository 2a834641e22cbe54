// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bizchat integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockChannel`] - Mock messaging channel with outbound capture
//! - [`MockPaymentAdapter`] - Payment adapter with a scripted outcome
//! - [`MemoryAuditSink`] - Audit sink backed by a vector
//! - [`TestHarness`] - The dispatcher wired over all of the above

pub mod audit;
pub mod harness;
pub mod mock_channel;
pub mod mock_payment;

pub use audit::MemoryAuditSink;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{MockChannel, SentBody, SentMessage};
pub use mock_payment::MockPaymentAdapter;
