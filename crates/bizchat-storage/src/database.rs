// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection management.
//!
//! All access goes through one `tokio_rusqlite::Connection`, which serializes
//! statements on a dedicated thread. Multi-statement operations run inside a
//! single `call` closure so they are atomic with respect to other callers.

use bizchat_core::BizchatError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the Bizchat SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (or create) the database at `path` and bring the schema up to date.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BizchatError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| BizchatError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(open_err)?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// Private in-memory database, used by tests and tooling.
    pub async fn open_in_memory() -> Result<Self, BizchatError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(open_err)?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), BizchatError> {
        self.conn
            .call(move |conn| -> Result<(), BizchatError> {
                let journal = if wal_mode { "WAL" } else { "DELETE" };
                conn.execute_batch(&format!(
                    "PRAGMA journal_mode = {journal};
                     PRAGMA synchronous = NORMAL;
                     PRAGMA foreign_keys = ON;
                     PRAGMA busy_timeout = 5000;"
                ))
                .map_err(|e| BizchatError::Storage {
                    source: Box::new(e),
                })?;
                run_migrations(conn)
            })
            .await
            .map_err(|e| match e {
                tokio_rusqlite::Error::Error(inner) => inner,
                other => BizchatError::Storage {
                    source: other.to_string().into(),
                },
            })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the main file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), BizchatError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

fn open_err(e: rusqlite::Error) -> BizchatError {
    BizchatError::Storage {
        source: Box::new(e),
    }
}

/// Convert a `tokio_rusqlite` failure into a storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BizchatError {
    BizchatError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/data/bizchat.db");
        Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_on_a_directory_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let err = Database::open(dir.path().to_str().unwrap(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, BizchatError::Storage { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn migrations_create_tables() {
        let db = Database::open_in_memory().await.unwrap();
        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        for expected in [
            "audit_log",
            "businesses",
            "conversations",
            "invoices",
            "message_templates",
            "messages",
            "products",
            "transactions",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        let path = path.to_str().unwrap();
        Database::open(path, true).await.unwrap();
        Database::open(path, true).await.unwrap();
    }
}
