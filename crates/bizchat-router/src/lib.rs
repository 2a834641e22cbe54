// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and message routing for the Bizchat router.
//!
//! This crate provides:
//! - [`classifier`]: keyword intent with a numbered menu for SMS-style channels
//! - [`MessageRouter`]: maps any [`bizchat_core::StandardizedMessage`] to a [`Route`]
//!
//! Routing is stateless per message. The same message always yields the
//! same route for a given configuration.

pub mod classifier;
pub mod router;

pub use classifier::{Intent, TextClass, classify_text};
pub use router::{MessageRouter, Route, pay_button_amount};
