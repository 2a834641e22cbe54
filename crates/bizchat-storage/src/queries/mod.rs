// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table family.

pub mod audit;
pub mod businesses;
pub mod conversations;
pub mod invoices;
pub mod messages;
pub mod templates;
pub mod transactions;

/// Shared fixtures for query tests.
#[cfg(test)]
pub(crate) mod test_support {
    use bizchat_core::types::{Business, ChannelType, Conversation, ConversationStatus};

    use crate::database::Database;

    pub async fn db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    pub fn business(id: &str) -> Business {
        Business {
            id: id.to_string(),
            name: "Asha Stores".to_string(),
            phone: Some("+919000000001".to_string()),
            upi_id: Some("asha@upi".to_string()),
            gstin: None,
            country: Some("IN".to_string()),
        }
    }

    pub fn conversation(id: &str, business_id: &str, phone: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            business_id: business_id.to_string(),
            customer_phone: phone.to_string(),
            customer_name: None,
            channel: ChannelType::WhatsApp,
            status: ConversationStatus::Active,
            last_message_at: "2026-01-01T00:00:00.000Z".to_string(),
            last_message_preview: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }
}
