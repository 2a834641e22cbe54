// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment domain types shared by storage, the payment bridge, and handlers.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// An amount in minor currency units (paise, cents).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub minor: i64,
    /// ISO 4217 code.
    pub currency: String,
}

impl Money {
    pub fn new(minor: i64, currency: impl Into<String>) -> Self {
        Self {
            minor,
            currency: currency.into(),
        }
    }

    /// Build from whole major units (`499` rupees becomes `49900` paise).
    pub fn from_major(major: i64, currency: impl Into<String>) -> Self {
        Self::new(major.saturating_mul(100), currency)
    }

    /// Major units without trailing zeros: `499` or `499.50`.
    pub fn major_string(&self) -> String {
        if self.minor % 100 == 0 {
            format!("{}", self.minor / 100)
        } else {
            self.decimal_string()
        }
    }

    /// Major units with exactly two decimals: `499.00`.
    pub fn decimal_string(&self) -> String {
        let sign = if self.minor < 0 { "-" } else { "" };
        let abs = self.minor.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    pub fn symbol(&self) -> &str {
        match self.currency.as_str() {
            "INR" => "₹",
            "USD" => "$",
            "EUR" => "€",
            "SGD" => "S$",
            "BRL" => "R$",
            "GBP" => "£",
            other => other,
        }
    }

    pub fn plus(&self, other: &Money) -> Money {
        Money::new(self.minor + other.minor, self.currency.clone())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.symbol(), self.major_string())
    }
}

/// A named tax with its rate in basis points (1800 = 18%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxInfo {
    pub name: String,
    pub rate_bp: u32,
}

impl TaxInfo {
    pub fn new(name: impl Into<String>, rate_bp: u32) -> Self {
        Self {
            name: name.into(),
            rate_bp,
        }
    }

    /// Tax owed on `amount`, rounded half up to the nearest minor unit.
    pub fn apply(&self, amount: &Money) -> Money {
        let raw = amount.minor * i64::from(self.rate_bp);
        Money::new((raw + 5_000) / 10_000, amount.currency.clone())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PaymentRegion {
    Global,
    NorthAmerica,
    Europe,
    India,
    Apac,
    Latam,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Upi,
    Wallet,
    Paypal,
}

/// Lifecycle of a payment transaction.
///
/// Transitions are monotonic: `pending -> {completed, failed} -> refunded`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded) | (Failed, Refunded)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == TransactionStatus::Refunded
    }
}

/// A payment attempt tied to a business and optionally a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: String,
    pub business_id: String,
    pub conversation_id: Option<String>,
    pub customer_phone: String,
    pub amount: Money,
    pub method: PaymentMethod,
    /// Reference the provider echoes back in callbacks.
    pub reference_id: Option<String>,
    pub provider_txn_id: Option<String>,
    pub status: TransactionStatus,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Result of a compare-and-swap status update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub transaction: PaymentTransaction,
    pub previous: TransactionStatus,
    /// False when the transaction already had the requested status.
    pub applied: bool,
}

impl StatusChange {
    /// True only for the first transition into `completed`.
    pub fn newly_completed(&self) -> bool {
        self.applied && self.transaction.status == TransactionStatus::Completed
    }
}

/// A request handed to a payment adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub transaction_id: String,
    pub business_id: String,
    pub conversation_id: Option<String>,
    pub customer_phone: String,
    pub amount: Money,
    pub description: String,
    /// ISO 3166 alpha-2 country code, used when no region is given.
    pub country: Option<String>,
    /// Filled in by the bridge from the resolved region.
    pub tax: Option<TaxInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub provider_reference: Option<String>,
    /// Hosted page the customer should visit, if any.
    pub redirect_url: Option<String>,
}

/// Invoice fields computed before the number and date are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub business_id: String,
    pub transaction_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: String,
    pub subtotal: Money,
    pub tax: Money,
    pub place_of_supply: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    /// `INV-YYYYMMDD-NNNN`.
    pub invoice_number: String,
    pub business_id: String,
    pub transaction_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: String,
    pub invoice_date: String,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub place_of_supply: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn money_formats_major_units() {
        let m = Money::from_major(499, "INR");
        assert_eq!(m.minor, 49_900);
        assert_eq!(m.to_string(), "₹499");
        assert_eq!(m.decimal_string(), "499.00");

        let cents = Money::new(12_345, "USD");
        assert_eq!(cents.to_string(), "$123.45");
    }

    #[test]
    fn gst_rounds_half_up() {
        let gst = TaxInfo::new("GST", 1_800);
        assert_eq!(gst.apply(&Money::from_major(499, "INR")).minor, 8_982);
        assert_eq!(gst.apply(&Money::new(1, "INR")).minor, 0);
        assert_eq!(gst.apply(&Money::new(3, "INR")).minor, 1);
    }

    #[test]
    fn status_transitions_are_monotonic() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn region_and_method_names_are_kebab_case() {
        assert_eq!(PaymentRegion::NorthAmerica.to_string(), "north-america");
        assert_eq!(
            PaymentMethod::from_str("credit-card").unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!(PaymentMethod::Upi.to_string(), "upi");
    }
}
