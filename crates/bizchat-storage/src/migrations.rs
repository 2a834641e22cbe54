// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! whenever a [`Database`](crate::Database) is opened.

use bizchat_core::BizchatError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply pending migrations.
///
/// Refinery records applied versions in `refinery_schema_history`, so this is
/// safe to run on every start.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), BizchatError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| BizchatError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
