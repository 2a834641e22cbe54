// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invoice queries.
//!
//! Numbers have the form `INV-YYYYMMDD-NNNN`, counting invoices issued on
//! the same UTC day.

use bizchat_core::BizchatError;
use bizchat_core::payment::{Invoice, InvoiceDraft};
use bizchat_core::time::now_iso;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{INVOICE_COLUMNS, invoice_from_row};

/// Create the invoice for a transaction unless it already has one.
pub async fn insert_invoice_once(
    db: &Database,
    draft: &InvoiceDraft,
) -> Result<Option<Invoice>, BizchatError> {
    let d = draft.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Invoice>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM invoices WHERE transaction_id = ?1",
                    params![d.transaction_id],
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(None);
            }

            let today = Utc::now();
            let prefix = format!("INV-{}-", today.format("%Y%m%d"));
            let issued_today: i64 = tx.query_row(
                "SELECT COUNT(*) FROM invoices WHERE invoice_number LIKE ?1 || '%'",
                params![prefix],
                |row| row.get(0),
            )?;

            let invoice = Invoice {
                id: uuid::Uuid::new_v4().to_string(),
                invoice_number: format!("{prefix}{:04}", issued_today + 1),
                business_id: d.business_id,
                transaction_id: d.transaction_id,
                customer_name: d.customer_name,
                customer_phone: d.customer_phone,
                invoice_date: today.format("%Y-%m-%d").to_string(),
                total: d.subtotal.plus(&d.tax),
                subtotal: d.subtotal,
                tax: d.tax,
                place_of_supply: d.place_of_supply,
            };
            tx.execute(
                "INSERT INTO invoices
                    (id, invoice_number, business_id, transaction_id, customer_name,
                     customer_phone, invoice_date, subtotal_minor, tax_minor, total_minor,
                     currency, place_of_supply, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    invoice.id,
                    invoice.invoice_number,
                    invoice.business_id,
                    invoice.transaction_id,
                    invoice.customer_name,
                    invoice.customer_phone,
                    invoice.invoice_date,
                    invoice.subtotal.minor,
                    invoice.tax.minor,
                    invoice.total.minor,
                    invoice.total.currency,
                    invoice.place_of_supply,
                    now_iso(),
                ],
            )?;
            tx.commit()?;
            Ok(Some(invoice))
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_invoice_for_transaction(
    db: &Database,
    transaction_id: &str,
) -> Result<Option<Invoice>, BizchatError> {
    let transaction_id = transaction_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE transaction_id = ?1"),
                params![transaction_id],
                invoice_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use bizchat_core::payment::{Money, PaymentMethod, PaymentTransaction, TransactionStatus};

    use super::*;
    use crate::queries::test_support::db;
    use crate::queries::transactions::insert_transaction;

    async fn seed_transaction(db: &Database, id: &str) {
        insert_transaction(
            db,
            &PaymentTransaction {
                id: id.into(),
                business_id: "biz-1".into(),
                conversation_id: None,
                customer_phone: "+919876543210".into(),
                amount: Money::from_major(499, "INR"),
                method: PaymentMethod::Upi,
                reference_id: Some(format!("REF-{id}")),
                provider_txn_id: None,
                status: TransactionStatus::Completed,
                notes: None,
                created_at: now_iso(),
                updated_at: now_iso(),
            },
        )
        .await
        .unwrap();
    }

    fn draft(transaction_id: &str) -> InvoiceDraft {
        InvoiceDraft {
            business_id: "biz-1".into(),
            transaction_id: transaction_id.into(),
            customer_name: Some("Ravi".into()),
            customer_phone: "+919876543210".into(),
            subtotal: Money::from_major(499, "INR"),
            tax: Money::new(8_982, "INR"),
            place_of_supply: Some("IN".into()),
        }
    }

    #[tokio::test]
    async fn first_insert_creates_numbered_invoice() {
        let db = db().await;
        seed_transaction(&db, "t1").await;
        let invoice = insert_invoice_once(&db, &draft("t1")).await.unwrap().unwrap();
        let prefix = format!("INV-{}-", Utc::now().format("%Y%m%d"));
        assert_eq!(invoice.invoice_number, format!("{prefix}0001"));
        assert_eq!(invoice.total.minor, 49_900 + 8_982);

        let stored = get_invoice_for_transaction(&db, "t1").await.unwrap();
        assert_eq!(stored, Some(invoice));
    }

    #[tokio::test]
    async fn second_insert_for_same_transaction_is_skipped() {
        let db = db().await;
        seed_transaction(&db, "t1").await;
        assert!(insert_invoice_once(&db, &draft("t1")).await.unwrap().is_some());
        assert!(insert_invoice_once(&db, &draft("t1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn numbers_increment_within_a_day() {
        let db = db().await;
        seed_transaction(&db, "t1").await;
        seed_transaction(&db, "t2").await;
        let first = insert_invoice_once(&db, &draft("t1")).await.unwrap().unwrap();
        let second = insert_invoice_once(&db, &draft("t2")).await.unwrap().unwrap();
        assert!(first.invoice_number.ends_with("-0001"));
        assert!(second.invoice_number.ends_with("-0002"));
    }
}
