// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use bizchat_config::model::StorageConfig;
use bizchat_core::payment::{
    Invoice, InvoiceDraft, PaymentTransaction, StatusChange, TransactionStatus,
};
use bizchat_core::types::{
    AppendOutcome, Business, ChannelType, Conversation, ConversationStatus, Message, NewMessage,
    Product,
};
use bizchat_core::{AdapterType, BizchatError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database, e.g. an in-memory one.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn db(&self) -> Result<&Database, BizchatError> {
        self.db.get().ok_or_else(|| BizchatError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BizchatError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BizchatError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BizchatError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Businesses and catalogue ---

    async fn upsert_business(&self, business: &Business) -> Result<(), BizchatError> {
        queries::businesses::upsert_business(self.db()?, business).await
    }

    async fn get_business(&self, id: &str) -> Result<Option<Business>, BizchatError> {
        queries::businesses::get_business(self.db()?, id).await
    }

    async fn find_business_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<Business>, BizchatError> {
        queries::businesses::find_business_by_phone(self.db()?, phone).await
    }

    async fn upsert_product(&self, product: &Product) -> Result<(), BizchatError> {
        queries::businesses::upsert_product(self.db()?, product).await
    }

    async fn list_products(&self, business_id: &str) -> Result<Vec<Product>, BizchatError> {
        queries::businesses::list_products(self.db()?, business_id).await
    }

    // --- Conversations ---

    async fn find_active_conversation(
        &self,
        business_id: &str,
        customer_phone: &str,
        channel: ChannelType,
    ) -> Result<Option<Conversation>, BizchatError> {
        queries::conversations::find_active_conversation(
            self.db()?,
            business_id,
            customer_phone,
            channel,
        )
        .await
    }

    async fn find_latest_active_conversation(
        &self,
        customer_phone: &str,
        channel: ChannelType,
    ) -> Result<Option<Conversation>, BizchatError> {
        queries::conversations::find_latest_active_conversation(self.db()?, customer_phone, channel)
            .await
    }

    async fn insert_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<bool, BizchatError> {
        queries::conversations::insert_conversation(self.db()?, conversation).await
    }

    async fn touch_conversation(&self, id: &str) -> Result<(), BizchatError> {
        queries::conversations::touch_conversation(self.db()?, id).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, BizchatError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn list_conversations(
        &self,
        business_id: &str,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, BizchatError> {
        queries::conversations::list_conversations(self.db()?, business_id, status).await
    }

    async fn close_conversation(&self, id: &str) -> Result<(), BizchatError> {
        queries::conversations::close_conversation(self.db()?, id).await
    }

    // --- Messages ---

    async fn append_message(&self, message: &NewMessage) -> Result<AppendOutcome, BizchatError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn message_exists(
        &self,
        channel: ChannelType,
        provider_message_id: &str,
    ) -> Result<bool, BizchatError> {
        queries::messages::message_exists(self.db()?, channel, provider_message_id).await
    }

    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, BizchatError> {
        queries::messages::get_messages(self.db()?, conversation_id, limit).await
    }

    // --- Transactions ---

    async fn insert_transaction(
        &self,
        transaction: &PaymentTransaction,
    ) -> Result<(), BizchatError> {
        queries::transactions::insert_transaction(self.db()?, transaction).await
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<PaymentTransaction>, BizchatError> {
        queries::transactions::get_transaction(self.db()?, id).await
    }

    async fn find_transaction_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Option<PaymentTransaction>, BizchatError> {
        queries::transactions::find_transaction_by_reference(self.db()?, reference_id).await
    }

    async fn list_transactions(
        &self,
        business_id: &str,
    ) -> Result<Vec<PaymentTransaction>, BizchatError> {
        queries::transactions::list_transactions(self.db()?, business_id).await
    }

    async fn transition_transaction(
        &self,
        id: &str,
        to: TransactionStatus,
        provider_txn_id: Option<&str>,
    ) -> Result<StatusChange, BizchatError> {
        queries::transactions::transition_transaction(self.db()?, id, to, provider_txn_id).await
    }

    // --- Invoices ---

    async fn insert_invoice_once(
        &self,
        draft: &InvoiceDraft,
    ) -> Result<Option<Invoice>, BizchatError> {
        queries::invoices::insert_invoice_once(self.db()?, draft).await
    }

    async fn get_invoice_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Invoice>, BizchatError> {
        queries::invoices::get_invoice_for_transaction(self.db()?, transaction_id).await
    }

    // --- Message templates ---

    async fn get_template(
        &self,
        name: &str,
        channel: ChannelType,
    ) -> Result<Option<String>, BizchatError> {
        queries::templates::get_template(self.db()?, name, channel).await
    }

    async fn upsert_template(
        &self,
        name: &str,
        channel: ChannelType,
        content: &str,
    ) -> Result<(), BizchatError> {
        queries::templates::upsert_template(self.db()?, name, channel, content).await
    }
}
