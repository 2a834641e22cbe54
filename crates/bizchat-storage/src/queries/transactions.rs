// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment transaction queries.

use bizchat_core::BizchatError;
use bizchat_core::payment::{PaymentTransaction, StatusChange, TransactionStatus};
use bizchat_core::time::now_iso;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{TRANSACTION_COLUMNS, transaction_from_row};

pub async fn insert_transaction(
    db: &Database,
    transaction: &PaymentTransaction,
) -> Result<(), BizchatError> {
    let t = transaction.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO transactions
                    (id, business_id, conversation_id, customer_phone, amount_minor, currency,
                     payment_method, reference_id, provider_txn_id, status, notes,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    t.id,
                    t.business_id,
                    t.conversation_id,
                    t.customer_phone,
                    t.amount.minor,
                    t.amount.currency,
                    t.method.to_string(),
                    t.reference_id,
                    t.provider_txn_id,
                    t.status.to_string(),
                    t.notes,
                    t.created_at,
                    t.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_transaction(
    db: &Database,
    id: &str,
) -> Result<Option<PaymentTransaction>, BizchatError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id],
                transaction_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn find_transaction_by_reference(
    db: &Database,
    reference_id: &str,
) -> Result<Option<PaymentTransaction>, BizchatError> {
    let reference_id = reference_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE reference_id = ?1"),
                params![reference_id],
                transaction_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest first.
pub async fn list_transactions(
    db: &Database,
    business_id: &str,
) -> Result<Vec<PaymentTransaction>, BizchatError> {
    let business_id = business_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE business_id = ?1
                 ORDER BY created_at DESC"
            ))?;
            let rows = stmt.query_map(params![business_id], transaction_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// What the read-check-write inside [`transition_transaction`] found.
enum Transition {
    Missing,
    Rejected(TransactionStatus),
    Done(StatusChange),
}

/// Move a transaction to `to` if the current status allows it.
///
/// The read and the conditional update run in one SQLite transaction on the
/// connection thread, so two concurrent callbacks cannot both complete the
/// same payment.
pub async fn transition_transaction(
    db: &Database,
    id: &str,
    to: TransactionStatus,
    provider_txn_id: Option<&str>,
) -> Result<StatusChange, BizchatError> {
    let key = id.to_string();
    let provider_txn_id = provider_txn_id.map(str::to_string);
    let outcome = db
        .connection()
        .call(move |conn| -> Result<Transition, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current = tx
                .query_row(
                    &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                    params![key],
                    transaction_from_row,
                )
                .optional()?;
            let Some(mut current) = current else {
                return Ok(Transition::Missing);
            };
            let previous = current.status;

            if previous == to {
                return Ok(Transition::Done(StatusChange {
                    transaction: current,
                    previous,
                    applied: false,
                }));
            }
            if !previous.can_transition_to(to) {
                return Ok(Transition::Rejected(previous));
            }

            let updated_at = now_iso();
            tx.execute(
                "UPDATE transactions
                 SET status = ?1, provider_txn_id = COALESCE(?2, provider_txn_id), updated_at = ?3
                 WHERE id = ?4 AND status = ?5",
                params![
                    to.to_string(),
                    provider_txn_id,
                    updated_at,
                    key,
                    previous.to_string()
                ],
            )?;
            tx.commit()?;

            current.status = to;
            if provider_txn_id.is_some() {
                current.provider_txn_id = provider_txn_id;
            }
            current.updated_at = updated_at;
            Ok(Transition::Done(StatusChange {
                transaction: current,
                previous,
                applied: true,
            }))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        Transition::Done(change) => Ok(change),
        Transition::Missing => Err(BizchatError::NotFound {
            entity: "transaction",
            id: id.to_string(),
        }),
        Transition::Rejected(from) => Err(BizchatError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}
