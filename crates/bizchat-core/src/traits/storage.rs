// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::BizchatError;
use crate::payment::{
    Invoice, InvoiceDraft, PaymentTransaction, StatusChange, TransactionStatus,
};
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AppendOutcome, Business, ChannelType, Conversation, ConversationStatus, Message, NewMessage,
    Product,
};

/// Adapter for storage and persistence backends.
///
/// Implementations must enforce two uniqueness rules: at most one active
/// conversation per (business, customer, channel), and at most one message
/// per (channel, provider message id).
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), BizchatError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), BizchatError>;

    // --- Businesses and catalogue ---

    async fn upsert_business(&self, business: &Business) -> Result<(), BizchatError>;

    async fn get_business(&self, id: &str) -> Result<Option<Business>, BizchatError>;

    /// Looks up a business by its canonical business-side number.
    async fn find_business_by_phone(&self, phone: &str)
    -> Result<Option<Business>, BizchatError>;

    async fn upsert_product(&self, product: &Product) -> Result<(), BizchatError>;

    async fn list_products(&self, business_id: &str) -> Result<Vec<Product>, BizchatError>;

    // --- Conversations ---

    /// Most recent active conversation for the exact tuple.
    async fn find_active_conversation(
        &self,
        business_id: &str,
        customer_phone: &str,
        channel: ChannelType,
    ) -> Result<Option<Conversation>, BizchatError>;

    /// Most recent active conversation for a contact on a channel, any business.
    async fn find_latest_active_conversation(
        &self,
        customer_phone: &str,
        channel: ChannelType,
    ) -> Result<Option<Conversation>, BizchatError>;

    /// Insert a new conversation. Returns `false` when another active
    /// conversation for the same tuple already exists.
    async fn insert_conversation(&self, conversation: &Conversation)
    -> Result<bool, BizchatError>;

    /// Set last activity to now.
    async fn touch_conversation(&self, id: &str) -> Result<(), BizchatError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, BizchatError>;

    async fn list_conversations(
        &self,
        business_id: &str,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, BizchatError>;

    async fn close_conversation(&self, id: &str) -> Result<(), BizchatError>;

    // --- Messages ---

    /// Append a message and update the owning conversation's preview and
    /// last activity in the same transaction.
    async fn append_message(&self, message: &NewMessage) -> Result<AppendOutcome, BizchatError>;

    /// Whether `(channel, provider_message_id)` is already stored.
    async fn message_exists(
        &self,
        channel: ChannelType,
        provider_message_id: &str,
    ) -> Result<bool, BizchatError>;

    /// Messages in creation order.
    async fn get_messages(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Message>, BizchatError>;

    // --- Transactions ---

    async fn insert_transaction(&self, transaction: &PaymentTransaction)
    -> Result<(), BizchatError>;

    async fn get_transaction(&self, id: &str) -> Result<Option<PaymentTransaction>, BizchatError>;

    async fn find_transaction_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Option<PaymentTransaction>, BizchatError>;

    async fn list_transactions(
        &self,
        business_id: &str,
    ) -> Result<Vec<PaymentTransaction>, BizchatError>;

    /// Compare-and-swap status update.
    ///
    /// Requesting the current status is a no-op (`applied == false`); any
    /// other non-monotonic change fails with `InvalidTransition`.
    async fn transition_transaction(
        &self,
        id: &str,
        to: TransactionStatus,
        provider_txn_id: Option<&str>,
    ) -> Result<StatusChange, BizchatError>;

    // --- Invoices ---

    /// Create the invoice for a transaction unless one exists. Returns the
    /// new invoice, or `None` if the transaction was already invoiced.
    async fn insert_invoice_once(&self, draft: &InvoiceDraft)
    -> Result<Option<Invoice>, BizchatError>;

    async fn get_invoice_for_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Invoice>, BizchatError>;

    // --- Message templates ---

    async fn get_template(
        &self,
        name: &str,
        channel: ChannelType,
    ) -> Result<Option<String>, BizchatError>;

    async fn upsert_template(
        &self,
        name: &str,
        channel: ChannelType,
        content: &str,
    ) -> Result<(), BizchatError>;
}
