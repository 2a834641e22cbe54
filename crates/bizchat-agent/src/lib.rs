// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message handling for the Bizchat router.
//!
//! The [`MessageDispatcher`] is the central coordinator that:
//! - Resolves the business and the customer's active conversation
//! - Persists each inbound message exactly once
//! - Classifies it into a route and runs the matching handler
//! - Delivers replies through the [`OutboundSender`]
//! - Answers every failure with an apology on the same channel

pub mod channels;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod replies;
pub mod resolver;
pub mod sender;
pub mod shutdown;

pub use channels::ChannelRegistry;
pub use context::AppContext;
pub use dispatcher::{DispatchOutcome, MessageDispatcher};
pub use resolver::ConversationResolver;
pub use sender::{OutboundSender, Reply};
