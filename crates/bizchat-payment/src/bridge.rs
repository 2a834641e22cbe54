// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The payment bridge: adapter registry, transaction lifecycle, callbacks.
//!
//! Adapters are keyed by `(region, method)`. A lookup that misses the
//! requested region falls back to the global adapter for the same method.
//! Every processed or failed payment emits a `bizchat_payments_total`
//! sample and an audit event, whatever the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use bizchat_config::model::PaymentConfig;
use bizchat_core::payment::{
    Invoice, InvoiceDraft, Money, PaymentMethod, PaymentRegion, PaymentRequest, PaymentResult,
    PaymentTransaction, StatusChange, TaxInfo, TransactionStatus,
};
use bizchat_core::time::now_iso;
use bizchat_core::types::{AuditEvent, Business};
use bizchat_core::{AuditSink, BizchatError, PaymentAdapter, StorageAdapter, record_detached};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::region::{RegionConfig, country_for_currency, region_config, resolve_region};
use crate::upi::{UpiIntent, render_qr_svg, upi_uri};

/// Invoices are issued with Indian GST regardless of the payment region.
const INVOICE_TAX_NAME: &str = "GST";
const INVOICE_TAX_BP: u32 = 1_800;
const PLACE_OF_SUPPLY: &str = "India";
const DEFAULT_CUSTOMER_NAME: &str = "Customer";

/// A pending payment started from a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    pub transaction: PaymentTransaction,
    pub region: PaymentRegion,
    pub method: PaymentMethod,
    /// Hosted payment page, or the provider's redirect when it supplied one.
    pub link: String,
    /// Where the UPI QR image is served. Only set for UPI.
    pub qr_url: Option<String>,
}

/// A rendered UPI QR code.
#[derive(Debug, Clone, PartialEq)]
pub struct UpiQr {
    pub uri: String,
    pub svg: String,
}

/// Body of a payment provider callback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentCallback {
    pub reference_id: Option<String>,
    pub status: String,
    #[serde(default, alias = "upi_txn_id")]
    pub provider_txn_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub change: StatusChange,
    /// Set only for the first completion of the transaction.
    pub invoice: Option<Invoice>,
}

pub struct PaymentBridge {
    adapters: HashMap<(PaymentRegion, PaymentMethod), Arc<dyn PaymentAdapter>>,
    storage: Arc<dyn StorageAdapter>,
    audit: Arc<dyn AuditSink>,
    link_base: String,
    public_url: String,
    payee_name: String,
    currency: String,
}

impl std::fmt::Debug for PaymentBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self
            .adapters
            .keys()
            .map(|(region, method)| format!("{region}/{method}"))
            .collect();
        keys.sort();
        f.debug_struct("PaymentBridge")
            .field("adapters", &keys)
            .field("link_base", &self.link_base)
            .field("public_url", &self.public_url)
            .finish()
    }
}

impl PaymentBridge {
    pub fn new(
        config: &PaymentConfig,
        public_url: &str,
        storage: Arc<dyn StorageAdapter>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            adapters: HashMap::new(),
            storage,
            audit,
            link_base: config.link_base.trim_end_matches('/').to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
            payee_name: config.payee_name.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Register an adapter for a region and method, replacing any previous one.
    pub fn register(
        mut self,
        region: PaymentRegion,
        method: PaymentMethod,
        adapter: Arc<dyn PaymentAdapter>,
    ) -> Self {
        debug!(%region, %method, adapter = adapter.name(), "payment adapter registered");
        self.adapters.insert((region, method), adapter);
        self
    }

    pub fn resolve_adapter(
        &self,
        region: PaymentRegion,
        method: PaymentMethod,
    ) -> Result<Arc<dyn PaymentAdapter>, BizchatError> {
        self.adapters
            .get(&(region, method))
            .or_else(|| self.adapters.get(&(PaymentRegion::Global, method)))
            .cloned()
            .ok_or_else(|| {
                BizchatError::payment(format!(
                    "no payment adapter for method {method} in region {region}"
                ))
            })
    }

    /// Run a payment through the adapter for the resolved region and method.
    ///
    /// The region comes from `region`, else the request's country, else
    /// global; the method defaults to the region's default method.
    pub async fn process_payment(
        &self,
        mut request: PaymentRequest,
        region: Option<PaymentRegion>,
        method: Option<PaymentMethod>,
    ) -> Result<PaymentResult, BizchatError> {
        let region_cfg = resolve_region(region, request.country.as_deref());
        let method = method.unwrap_or(region_cfg.default_method);
        request.tax = Some(region_cfg.tax.clone());

        let outcome = match self.resolve_adapter(region_cfg.region, method) {
            Ok(adapter) => adapter.process_payment(&request).await,
            Err(e) => Err(e),
        };

        let label = if outcome.is_ok() { "processed" } else { "failed" };
        metrics::counter!(
            "bizchat_payments_total",
            "region" => region_cfg.region.to_string(),
            "method" => method.to_string(),
            "outcome" => label
        )
        .increment(1);

        let mut metadata = serde_json::json!({
            "region": region_cfg.region.to_string(),
            "method": method.to_string(),
            "amount": request.amount.decimal_string(),
            "currency": request.amount.currency,
        });
        match &outcome {
            Ok(result) => {
                metadata["status"] = result.status.to_string().into();
                info!(
                    transaction_id = %request.transaction_id,
                    region = %region_cfg.region,
                    %method,
                    status = %result.status,
                    "payment processed"
                );
            }
            Err(e) => {
                metadata["error"] = e.to_string().into();
                warn!(
                    transaction_id = %request.transaction_id,
                    region = %region_cfg.region,
                    %method,
                    error = %e,
                    "payment failed"
                );
            }
        }
        record_detached(
            &self.audit,
            AuditEvent::new(format!("payment_{label}"), "transaction")
                .resource(request.transaction_id.clone())
                .metadata(metadata),
        );

        outcome
    }

    /// Register a pending transaction for `amount_major` and process it.
    ///
    /// Fails with a payment error when the region's method is UPI and the
    /// business has no UPI id.
    pub async fn start_payment(
        &self,
        business: &Business,
        conversation_id: Option<&str>,
        customer_phone: &str,
        amount_major: i64,
    ) -> Result<PaymentSession, BizchatError> {
        if amount_major <= 0 {
            return Err(BizchatError::payment(format!(
                "payment amount must be positive, got {amount_major}"
            )));
        }
        let country = business
            .country
            .clone()
            .or_else(|| country_for_currency(&self.currency).map(str::to_string));
        let region_cfg = resolve_region(None, country.as_deref());
        let method = region_cfg.default_method;

        if method == PaymentMethod::Upi && !has_upi_id(business) {
            return Err(BizchatError::payment(format!(
                "business {} has no UPI id configured",
                business.id
            )));
        }

        let now = now_iso();
        let transaction = PaymentTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: business.id.clone(),
            conversation_id: conversation_id.map(str::to_string),
            customer_phone: customer_phone.to_string(),
            amount: Money::from_major(amount_major, region_cfg.currency),
            method,
            reference_id: Some(uuid::Uuid::new_v4().simple().to_string()),
            provider_txn_id: None,
            status: TransactionStatus::Pending,
            notes: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.storage.insert_transaction(&transaction).await?;

        let request = PaymentRequest {
            transaction_id: transaction.id.clone(),
            business_id: business.id.clone(),
            conversation_id: transaction.conversation_id.clone(),
            customer_phone: transaction.customer_phone.clone(),
            amount: transaction.amount.clone(),
            description: format!("Payment to {}", business.name),
            country,
            tax: None,
        };

        let result = match self
            .process_payment(request, Some(region_cfg.region), Some(method))
            .await
        {
            Ok(result) => result,
            Err(e) => {
                if let Err(mark) = self
                    .storage
                    .transition_transaction(&transaction.id, TransactionStatus::Failed, None)
                    .await
                {
                    warn!(transaction_id = %transaction.id, error = %mark, "failed to mark transaction failed");
                }
                return Err(e);
            }
        };

        let transaction = if result.status == TransactionStatus::Pending {
            transaction
        } else {
            self.storage
                .transition_transaction(
                    &transaction.id,
                    result.status,
                    result.provider_reference.as_deref(),
                )
                .await?
                .transaction
        };

        let link = result
            .redirect_url
            .unwrap_or_else(|| self.payment_link(&transaction.id, region_cfg.region, method));
        let qr_url = (method == PaymentMethod::Upi).then(|| self.qr_url(&transaction.id));

        Ok(PaymentSession {
            transaction,
            region: region_cfg.region,
            method,
            link,
            qr_url,
        })
    }

    /// Hosted payment page URL for a transaction.
    pub fn payment_link(
        &self,
        transaction_id: &str,
        region: PaymentRegion,
        method: PaymentMethod,
    ) -> String {
        format!(
            "{}/{transaction_id}?region={region}&method={method}",
            self.link_base
        )
    }

    pub fn qr_url(&self, transaction_id: &str) -> String {
        format!("{}/pay/{transaction_id}/qr.svg", self.public_url)
    }

    /// Render the UPI QR code for a transaction.
    ///
    /// Returns `None` for unknown transactions and for non-UPI methods.
    pub async fn upi_qr(&self, transaction_id: &str) -> Result<Option<UpiQr>, BizchatError> {
        let Some(transaction) = self.storage.get_transaction(transaction_id).await? else {
            return Ok(None);
        };
        if transaction.method != PaymentMethod::Upi {
            return Ok(None);
        }
        let business = self
            .storage
            .get_business(&transaction.business_id)
            .await?
            .ok_or_else(|| BizchatError::NotFound {
                entity: "business",
                id: transaction.business_id.clone(),
            })?;
        let payee = business
            .upi_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                BizchatError::payment(format!("business {} has no UPI id configured", business.id))
            })?;
        let payee_name = if business.name.trim().is_empty() {
            self.payee_name.as_str()
        } else {
            business.name.as_str()
        };
        let note = format!("Payment to {payee_name}");
        let reference = transaction
            .reference_id
            .as_deref()
            .unwrap_or(transaction.id.as_str());

        let uri = upi_uri(&UpiIntent {
            payee,
            payee_name,
            amount: &transaction.amount,
            note: &note,
            reference,
        })?;
        let svg = render_qr_svg(&uri)?;

        record_detached(
            &self.audit,
            AuditEvent::new("qr_generated", "transaction")
                .resource(transaction.id.clone())
                .metadata(serde_json::json!({
                    "amount": transaction.amount.decimal_string(),
                    "currency": transaction.amount.currency,
                })),
        );
        Ok(Some(UpiQr { uri, svg }))
    }

    /// Apply a provider callback. `SUCCESS` completes the transaction, any
    /// other status fails it. Replays of an applied status change nothing,
    /// except issuing a still-missing invoice for a completed transaction.
    pub async fn handle_callback(
        &self,
        callback: &PaymentCallback,
    ) -> Result<CallbackOutcome, BizchatError> {
        let reference = callback
            .reference_id
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| BizchatError::InvalidPayload("callback is missing reference_id".into()))?;

        let transaction = self
            .storage
            .find_transaction_by_reference(reference)
            .await?
            .ok_or_else(|| BizchatError::NotFound {
                entity: "transaction",
                id: reference.to_string(),
            })?;

        let target = if callback.status.eq_ignore_ascii_case("success") {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let change = self
            .storage
            .transition_transaction(&transaction.id, target, callback.provider_txn_id.as_deref())
            .await?;

        info!(
            transaction_id = %transaction.id,
            status = %change.transaction.status,
            applied = change.applied,
            "payment callback handled"
        );
        record_detached(
            &self.audit,
            AuditEvent::new("payment_callback", "transaction")
                .resource(transaction.id.clone())
                .metadata(serde_json::json!({
                    "status": callback.status,
                    "provider_txn_id": callback.provider_txn_id,
                    "applied": change.applied,
                })),
        );

        // A completed transaction whose invoice insert failed earlier gets
        // it on the replay; the unique transaction id keeps this once-only.
        let invoice = if change.transaction.status == TransactionStatus::Completed {
            self.issue_invoice(&change.transaction).await?
        } else {
            None
        };
        Ok(CallbackOutcome { change, invoice })
    }

    /// Move a completed transaction to refunded once the provider accepts
    /// the reversal. Returns `false` when the provider declined.
    pub async fn reverse_transaction(
        &self,
        transaction_id: &str,
        region: Option<PaymentRegion>,
    ) -> Result<bool, BizchatError> {
        let transaction = self
            .storage
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| BizchatError::NotFound {
                entity: "transaction",
                id: transaction_id.to_string(),
            })?;
        if transaction.status != TransactionStatus::Completed {
            return Err(BizchatError::InvalidTransition {
                from: transaction.status.to_string(),
                to: TransactionStatus::Refunded.to_string(),
            });
        }

        let region_cfg = match region {
            Some(region) => region_config(region),
            None => self.region_for_business(&transaction.business_id).await?,
        };
        let adapter = self.resolve_adapter(region_cfg.region, transaction.method)?;
        if !adapter.reverse_transaction(transaction_id).await? {
            warn!(transaction_id, adapter = adapter.name(), "refund declined by provider");
            return Ok(false);
        }
        self.storage
            .transition_transaction(transaction_id, TransactionStatus::Refunded, None)
            .await?;
        info!(transaction_id, "transaction refunded");
        Ok(true)
    }

    async fn region_for_business(
        &self,
        business_id: &str,
    ) -> Result<&'static RegionConfig, BizchatError> {
        let country = self
            .storage
            .get_business(business_id)
            .await?
            .and_then(|b| b.country)
            .or_else(|| country_for_currency(&self.currency).map(str::to_string));
        Ok(resolve_region(None, country.as_deref()))
    }

    async fn issue_invoice(
        &self,
        transaction: &PaymentTransaction,
    ) -> Result<Option<Invoice>, BizchatError> {
        let customer_name = match &transaction.conversation_id {
            Some(id) => self
                .storage
                .get_conversation(id)
                .await?
                .and_then(|c| c.customer_name),
            None => None,
        };
        let draft = draft_invoice(transaction, customer_name);
        let invoice = self.storage.insert_invoice_once(&draft).await?;
        if let Some(invoice) = &invoice {
            info!(
                transaction_id = %transaction.id,
                invoice_number = %invoice.invoice_number,
                total = %invoice.total,
                "invoice generated"
            );
            record_detached(
                &self.audit,
                AuditEvent::new("invoice_generated", "invoice")
                    .resource(invoice.id.clone())
                    .metadata(serde_json::json!({
                        "invoice_number": invoice.invoice_number,
                        "transaction_id": transaction.id,
                        "total": invoice.total.decimal_string(),
                    })),
            );
        }
        Ok(invoice)
    }
}

fn has_upi_id(business: &Business) -> bool {
    business
        .upi_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty())
}

/// Invoice fields for a completed transaction: the amount is the subtotal
/// and GST is added on top.
pub fn draft_invoice(
    transaction: &PaymentTransaction,
    customer_name: Option<String>,
) -> InvoiceDraft {
    let tax = TaxInfo::new(INVOICE_TAX_NAME, INVOICE_TAX_BP).apply(&transaction.amount);
    InvoiceDraft {
        business_id: transaction.business_id.clone(),
        transaction_id: transaction.id.clone(),
        customer_name: Some(customer_name.unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_string())),
        customer_phone: transaction.customer_phone.clone(),
        subtotal: transaction.amount.clone(),
        tax,
        place_of_supply: Some(PLACE_OF_SUPPLY.to_string()),
    }
}
