// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mappers shared by the query modules.

use std::str::FromStr;

use bizchat_core::payment::{Invoice, Money, PaymentTransaction};
use bizchat_core::types::{Business, Conversation, Message, Product};
use rusqlite::Row;
use rusqlite::types::Type;

/// Read a TEXT column into a strum-backed enum.
pub(crate) fn parse_col<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) const BUSINESS_COLUMNS: &str = "id, name, phone, upi_id, gstin, country";

pub(crate) fn business_from_row(row: &Row<'_>) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        upi_id: row.get(3)?,
        gstin: row.get(4)?,
        country: row.get(5)?,
    })
}

pub(crate) fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        price: Money::new(row.get(3)?, row.get::<_, String>(4)?),
    })
}

pub(crate) const CONVERSATION_COLUMNS: &str = "id, business_id, customer_phone, customer_name, \
     channel_type, status, last_message_at, last_message_preview, created_at";

pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        business_id: row.get(1)?,
        customer_phone: row.get(2)?,
        customer_name: row.get(3)?,
        channel: parse_col(row, 4)?,
        status: parse_col(row, 5)?,
        last_message_at: row.get(6)?,
        last_message_preview: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub(crate) const MESSAGE_COLUMNS: &str = "id, conversation_id, channel_type, sender_type, \
     message_type, content, media_url, provider_message_id, delivery_status, created_at";

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        channel: parse_col(row, 2)?,
        sender: parse_col(row, 3)?,
        kind: parse_col(row, 4)?,
        content: row.get(5)?,
        media_url: row.get(6)?,
        provider_message_id: row.get(7)?,
        delivery_status: parse_col(row, 8)?,
        created_at: row.get(9)?,
    })
}

pub(crate) const TRANSACTION_COLUMNS: &str = "id, business_id, conversation_id, customer_phone, \
     amount_minor, currency, payment_method, reference_id, provider_txn_id, status, notes, \
     created_at, updated_at";

pub(crate) fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<PaymentTransaction> {
    Ok(PaymentTransaction {
        id: row.get(0)?,
        business_id: row.get(1)?,
        conversation_id: row.get(2)?,
        customer_phone: row.get(3)?,
        amount: Money::new(row.get(4)?, row.get::<_, String>(5)?),
        method: parse_col(row, 6)?,
        reference_id: row.get(7)?,
        provider_txn_id: row.get(8)?,
        status: parse_col(row, 9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

pub(crate) const INVOICE_COLUMNS: &str = "id, invoice_number, business_id, transaction_id, \
     customer_name, customer_phone, invoice_date, subtotal_minor, tax_minor, total_minor, \
     currency, place_of_supply";

pub(crate) fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let currency: String = row.get(10)?;
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        business_id: row.get(2)?,
        transaction_id: row.get(3)?,
        customer_name: row.get(4)?,
        customer_phone: row.get(5)?,
        invoice_date: row.get(6)?,
        subtotal: Money::new(row.get(7)?, currency.clone()),
        tax: Money::new(row.get(8)?, currency.clone()),
        total: Money::new(row.get(9)?, currency),
        place_of_supply: row.get(11)?,
    })
}
