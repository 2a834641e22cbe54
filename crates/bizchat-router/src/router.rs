// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing: picks the handler for a standardized message.
//!
//! Text goes through the classifier; every other kind routes on its type.
//! Button payloads of the form `pay_<amount>` join the payment path with the
//! amount (in major units) overriding the configured default.

use bizchat_config::model::RoutingConfig;
use bizchat_core::types::{ChannelType, MessagePayload, StandardizedMessage};
use tracing::debug;

use crate::classifier::{Intent, TextClass, classify_text};

const PAY_BUTTON_PREFIX: &str = "pay_";

/// The handler a message is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Start a payment. `amount` is an explicit major-unit amount.
    Payment { amount: Option<i64> },
    Order,
    Price,
    Default,
    /// Numeric menu entry that does not exist.
    InvalidSelection { selection: String },
    Image,
    Document,
    Location,
    /// Button click echoed back by label.
    Button { label: String },
    Template,
}

impl Route {
    /// Stable label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Route::Payment { .. } => "payment",
            Route::Order => "order",
            Route::Price => "price",
            Route::Default => "default",
            Route::InvalidSelection { .. } => "invalid_selection",
            Route::Image => "image",
            Route::Document => "document",
            Route::Location => "location",
            Route::Button { .. } => "button",
            Route::Template => "template",
        }
    }

    fn from_intent(intent: Intent) -> Self {
        match intent {
            Intent::Payment => Route::Payment { amount: None },
            Intent::Order => Route::Order,
            Intent::Price => Route::Price,
            Intent::Default => Route::Default,
        }
    }
}

/// Extract the amount from a `pay_<amount>` button payload.
///
/// Leading digits after the prefix are the amount (`pay_500`, `pay_500_inr`).
/// Returns `None` for other payloads or a zero amount.
pub fn pay_button_amount(payload: &str) -> Option<i64> {
    let rest = payload.strip_prefix(PAY_BUTTON_PREFIX)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().ok().filter(|amount| *amount > 0)
}

/// Stateless router configured with the channels that use the numeric menu.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    numeric_menu_channels: Vec<ChannelType>,
}

impl MessageRouter {
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            numeric_menu_channels: config.numeric_menu_channels.clone(),
        }
    }

    /// Whether bare integers on `channel` are menu selections.
    pub fn numeric_menu(&self, channel: ChannelType) -> bool {
        self.numeric_menu_channels.contains(&channel)
    }

    pub fn route(&self, message: &StandardizedMessage) -> Route {
        let route = match &message.payload {
            MessagePayload::Text { body } => {
                match classify_text(body, self.numeric_menu(message.channel)) {
                    TextClass::InvalidSelection(selection) => {
                        Route::InvalidSelection { selection }
                    }
                    TextClass::Menu(intent) | TextClass::Keyword(intent) => {
                        Route::from_intent(intent)
                    }
                }
            }
            MessagePayload::Image { .. } => Route::Image,
            MessagePayload::Document { .. } => Route::Document,
            MessagePayload::Location { .. } => Route::Location,
            MessagePayload::Button { payload, text } => match pay_button_amount(payload) {
                Some(amount) => Route::Payment {
                    amount: Some(amount),
                },
                None => Route::Button {
                    label: text.clone(),
                },
            },
            MessagePayload::Template { .. } => Route::Template,
        };
        debug!(
            message_id = %message.id,
            channel = %message.channel,
            route = route.name(),
            "message routed"
        );
        route
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new(&RoutingConfig::default())
    }
}
