// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business and product catalogue queries.

use bizchat_core::BizchatError;
use bizchat_core::types::{Business, Product};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{BUSINESS_COLUMNS, business_from_row, product_from_row};

/// Insert a business or update it in place.
pub async fn upsert_business(db: &Database, business: &Business) -> Result<(), BizchatError> {
    let b = business.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO businesses (id, name, phone, upi_id, gstin, country)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    phone = excluded.phone,
                    upi_id = excluded.upi_id,
                    gstin = excluded.gstin,
                    country = excluded.country,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![b.id, b.name, b.phone, b.upi_id, b.gstin, b.country],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_business(db: &Database, id: &str) -> Result<Option<Business>, BizchatError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?1"),
                params![id],
                business_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Find the business that owns a canonical business-side number.
pub async fn find_business_by_phone(
    db: &Database,
    phone: &str,
) -> Result<Option<Business>, BizchatError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE phone = ?1
                     ORDER BY created_at ASC LIMIT 1"
                ),
                params![phone],
                business_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert_product(db: &Database, product: &Product) -> Result<(), BizchatError> {
    let p = product.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO products (id, business_id, name, price_minor, currency)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    price_minor = excluded.price_minor,
                    currency = excluded.currency,
                    active = 1",
                params![p.id, p.business_id, p.name, p.price.minor, p.price.currency],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Active products, cheapest first.
pub async fn list_products(db: &Database, business_id: &str) -> Result<Vec<Product>, BizchatError> {
    let business_id = business_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, business_id, name, price_minor, currency FROM products
                 WHERE business_id = ?1 AND active = 1
                 ORDER BY price_minor ASC, name ASC",
            )?;
            let rows = stmt.query_map(params![business_id], product_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
