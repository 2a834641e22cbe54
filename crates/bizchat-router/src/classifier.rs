// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword intent classification for text messages.
//!
//! Pure string matching: no network, no state. Keyword groups are checked
//! in priority order (payment, order, price) and the first group with any
//! substring match wins, so "pay for my order" is a payment.

use std::sync::LazyLock;

use regex::Regex;

/// The classified purpose of a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Payment,
    Order,
    Price,
    Default,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Payment => write!(f, "payment"),
            Intent::Order => write!(f, "order"),
            Intent::Price => write!(f, "price"),
            Intent::Default => write!(f, "default"),
        }
    }
}

/// Result of classifying one text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextClass {
    /// A numbered menu entry that maps to an intent.
    Menu(Intent),
    /// A bare positive integer outside the menu.
    InvalidSelection(String),
    /// Keyword match (or the default when nothing matched).
    Keyword(Intent),
}

impl TextClass {
    /// The intent to handle, if any.
    pub fn intent(&self) -> Option<Intent> {
        match self {
            TextClass::Menu(intent) | TextClass::Keyword(intent) => Some(*intent),
            TextClass::InvalidSelection(_) => None,
        }
    }
}

const PAYMENT_KEYWORDS: &[&str] = &["pay", "payment", "upi", "money"];
const ORDER_KEYWORDS: &[&str] = &["order", "buy", "purchase"];
const PRICE_KEYWORDS: &[&str] = &["price", "cost", "rate", "how much"];

/// Checked top to bottom; the first group with a hit decides.
const KEYWORD_PRIORITY: &[(Intent, &[&str])] = &[
    (Intent::Payment, PAYMENT_KEYWORDS),
    (Intent::Order, ORDER_KEYWORDS),
    (Intent::Price, PRICE_KEYWORDS),
];

/// Numbered menu shown on menu-driven channels: `1` order, `2` price, `3` pay.
pub const MENU: &[(&str, Intent)] = &[
    ("1", Intent::Order),
    ("2", Intent::Price),
    ("3", Intent::Payment),
];

/// A bare positive integer: first digit 1-9, then any digits.
static MENU_SELECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9][0-9]*$").expect("valid regex"));

/// Whether the trimmed body is a numeric menu selection.
pub fn is_menu_selection(body: &str) -> bool {
    MENU_SELECTION.is_match(body.trim())
}

/// Keyword intent of a body, ignoring the numeric menu.
pub fn keyword_intent(body: &str) -> Intent {
    let lower = body.to_lowercase();
    KEYWORD_PRIORITY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Default)
}

/// Classify a text body. `numeric_menu` enables the numbered menu, which
/// takes precedence over keywords and never falls through to them.
pub fn classify_text(body: &str, numeric_menu: bool) -> TextClass {
    if numeric_menu && is_menu_selection(body) {
        let selection = body.trim();
        return match MENU.iter().find(|(key, _)| *key == selection) {
            Some((_, intent)) => TextClass::Menu(*intent),
            None => TextClass::InvalidSelection(selection.to_string()),
        };
    }
    TextClass::Keyword(keyword_intent(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_beats_order() {
        assert_eq!(keyword_intent("I want to pay for my order"), Intent::Payment);
    }

    #[test]
    fn order_beats_price() {
        assert_eq!(keyword_intent("what would it cost to order 3?"), Intent::Order);
    }

    #[test]
    fn keyword_groups() {
        assert_eq!(keyword_intent("Send UPI details"), Intent::Payment);
        assert_eq!(keyword_intent("can I BUY this"), Intent::Order);
        assert_eq!(keyword_intent("How much for product A"), Intent::Price);
        assert_eq!(keyword_intent("what's the rate"), Intent::Price);
        assert_eq!(keyword_intent("hello there"), Intent::Default);
        assert_eq!(keyword_intent(""), Intent::Default);
    }

    #[test]
    fn keywords_match_as_substrings() {
        // "separate" contains "rate".
        assert_eq!(keyword_intent("separate"), Intent::Price);
    }

    #[test]
    fn menu_selection_pattern() {
        assert!(is_menu_selection("2"));
        assert!(is_menu_selection(" 42 "));
        assert!(!is_menu_selection("0"));
        assert!(!is_menu_selection("07"));
        assert!(!is_menu_selection("-1"));
        assert!(!is_menu_selection("1.5"));
        assert!(!is_menu_selection("2 please"));
        assert!(!is_menu_selection(""));
    }

    #[test]
    fn numeric_menu_maps_entries() {
        assert_eq!(classify_text("1", true), TextClass::Menu(Intent::Order));
        assert_eq!(classify_text("2", true), TextClass::Menu(Intent::Price));
        assert_eq!(classify_text(" 3 ", true), TextClass::Menu(Intent::Payment));
        assert_eq!(
            classify_text("4", true),
            TextClass::InvalidSelection("4".into())
        );
        assert_eq!(classify_text("4", true).intent(), None);
    }

    #[test]
    fn numeric_menu_disabled_falls_through() {
        assert_eq!(classify_text("2", false), TextClass::Keyword(Intent::Default));
        assert_eq!(classify_text("0", true), TextClass::Keyword(Intent::Default));
    }

    #[test]
    fn intent_display() {
        assert_eq!(Intent::Payment.to_string(), "payment");
        assert_eq!(Intent::Default.to_string(), "default");
    }
}
