// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing reply texts.
//!
//! SMS replies are brief and point at the numeric menu; chat channels get
//! conversational phrasing.

use bizchat_core::payment::{Money, TransactionStatus};
use bizchat_core::types::{ChannelType, Product};

pub const MENU_PROMPT: &str = "Reply with: 1-Products, 2-Prices, 3-Pay";

pub const PAYMENT_APOLOGY: &str =
    "I'm sorry, there was a problem processing your payment request. Please try again later.";

pub const GENERIC_APOLOGY: &str =
    "I'm sorry, something went wrong while handling your message. Please try again later.";

/// Free-shipping threshold quoted in price replies, in major units.
const FREE_SHIPPING_OVER: i64 = 999;

/// A product line shown in order and price replies.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub name: String,
    pub price: Money,
}

impl From<Product> for CatalogItem {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
        }
    }
}

/// Shown when a business has no products on file.
pub fn builtin_catalogue(currency: &str) -> Vec<CatalogItem> {
    [("Product A", 499), ("Product B", 999), ("Product C", 1_499)]
        .into_iter()
        .map(|(name, price)| CatalogItem {
            name: name.to_string(),
            price: Money::from_major(price, currency),
        })
        .collect()
}

fn brief(channel: ChannelType) -> bool {
    channel == ChannelType::Sms
}

fn product_list(items: &[CatalogItem]) -> String {
    items
        .iter()
        .map(|item| format!("- {}: {}", item.name, item.price))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn default_reply(channel: ChannelType) -> String {
    if brief(channel) {
        format!("Thank you for your message. {MENU_PROMPT}")
    } else {
        "Thank you for your message. How can I help you today? You can ask about our products, prices, or place an order.".to_string()
    }
}

pub fn invalid_selection() -> String {
    format!("Invalid selection. {MENU_PROMPT}")
}

pub fn order_reply(channel: ChannelType, items: &[CatalogItem]) -> String {
    let list = product_list(items);
    if brief(channel) {
        format!("Products:\n{list}\nReply with product name & qty (e.g. 'A 2')")
    } else {
        format!(
            "Thank you for your interest in placing an order. Here are our popular products:\n\n{list}\n\nTo order, please reply with the product name and quantity (e.g., \"2 Product A\")."
        )
    }
}

pub fn price_reply(channel: ChannelType, items: &[CatalogItem]) -> String {
    let list = product_list(items);
    let currency = items
        .first()
        .map(|item| item.price.currency.as_str())
        .unwrap_or("INR");
    let threshold = Money::from_major(FREE_SHIPPING_OVER, currency);
    if brief(channel) {
        format!("Prices:\n{list}\nInc GST. Free ship >{threshold}.")
    } else {
        format!(
            "Here are our current prices:\n\n{list}\n\nAll prices include GST. Shipping is free for orders above {threshold}."
        )
    }
}

pub fn image_ack() -> &'static str {
    "Thank you for sending the image. Our team will review it shortly."
}

pub fn document_ack() -> &'static str {
    "Thank you for sending the document. Our team will review it shortly."
}

pub fn location_ack() -> &'static str {
    "Thank you for sharing your location. Our team will check if we deliver to your area."
}

pub fn button_echo(label: &str) -> String {
    format!("Thank you for your selection: {label}")
}

pub fn template_ack() -> &'static str {
    "Thank you for your response."
}

pub fn qr_caption(amount: &Money, business: &str) -> String {
    format!("Pay {amount} to {business}")
}

pub fn scan_instructions(amount: &Money) -> String {
    format!(
        "Please scan this QR code using any UPI app to pay {amount}. Your payment will be confirmed automatically."
    )
}

pub fn payment_link(channel: ChannelType, amount: &Money, business: &str, link: &str) -> String {
    if brief(channel) {
        format!("Pay {amount} to {business}: {link}")
    } else {
        format!("To pay {amount} to {business}, open this secure link: {link}")
    }
}

/// Sent after a provider callback settles a transaction.
pub fn payment_status(
    amount: &Money,
    business: &str,
    status: TransactionStatus,
    transaction_id: &str,
    invoice_number: Option<&str>,
) -> String {
    let outcome = match status {
        TransactionStatus::Completed => "successful",
        TransactionStatus::Failed => "failed",
        TransactionStatus::Refunded => "refunded",
        TransactionStatus::Pending => "pending",
    };
    let mut text =
        format!("Payment of {amount} to {business} is {outcome}. Transaction ID: {transaction_id}");
    if let Some(number) = invoice_number {
        text.push_str(&format!("\nInvoice: {number}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_replies_mention_the_menu() {
        assert!(default_reply(ChannelType::Sms).contains("1-Products"));
        assert!(!default_reply(ChannelType::WhatsApp).contains("1-Products"));
        assert!(invalid_selection().starts_with("Invalid selection"));
    }

    #[test]
    fn price_replies_mention_gst_on_every_channel() {
        let items = builtin_catalogue("INR");
        for channel in [ChannelType::Sms, ChannelType::WhatsApp, ChannelType::Web] {
            let text = price_reply(channel, &items);
            assert!(text.contains("GST"), "{channel}: {text}");
            assert!(text.contains("- Product A: ₹499"));
        }
        assert!(price_reply(ChannelType::Sms, &items).contains(">₹999"));
    }

    #[test]
    fn order_reply_lists_products() {
        let items = builtin_catalogue("INR");
        let chat = order_reply(ChannelType::WhatsApp, &items);
        assert!(chat.contains("- Product C: ₹1499"));
        assert!(order_reply(ChannelType::Sms, &items).len() < chat.len());
    }

    #[test]
    fn payment_texts() {
        let amount = Money::from_major(499, "INR");
        assert_eq!(
            payment_link(ChannelType::Sms, &amount, "Chai Point", "https://p/1"),
            "Pay ₹499 to Chai Point: https://p/1"
        );
        assert!(scan_instructions(&amount).contains("pay ₹499"));
        let status = payment_status(
            &amount,
            "Chai Point",
            TransactionStatus::Completed,
            "txn-1",
            Some("INV-20260101-0001"),
        );
        assert!(status.starts_with("Payment of ₹499 to Chai Point is successful"));
        assert!(status.ends_with("Invoice: INV-20260101-0001"));
    }
}
