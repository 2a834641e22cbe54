// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bizchat message router.

use thiserror::Error;

/// The primary error type used across all Bizchat adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BizchatError {
    /// Configuration errors (invalid TOML, missing credentials, unknown provider).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (provider API failure, unsupported operation).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A webhook body did not match any known provider shape.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A webhook signature or shared secret did not match.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// Payment errors (adapter unavailable, payee not configured, provider rejection).
    #[error("payment error: {message}")]
    Payment {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A payment transaction status change that would break monotonicity.
    #[error("invalid transaction status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Requested adapter was not found in the registry.
    #[error("adapter not found: {adapter_type}/{name}")]
    AdapterNotFound { adapter_type: String, name: String },

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BizchatError {
    /// Shorthand for a payment error without an underlying cause.
    pub fn payment(message: impl Into<String>) -> Self {
        BizchatError::Payment {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a channel error without an underlying cause.
    pub fn channel(message: impl Into<String>) -> Self {
        BizchatError::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the customer should see the payment-specific apology.
    pub fn is_payment(&self) -> bool {
        matches!(
            self,
            BizchatError::Payment { .. } | BizchatError::InvalidTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_errors_are_flagged() {
        assert!(BizchatError::payment("no payee").is_payment());
        assert!(
            BizchatError::InvalidTransition {
                from: "completed".into(),
                to: "pending".into()
            }
            .is_payment()
        );
        assert!(!BizchatError::Internal("boom".into()).is_payment());
        assert!(!BizchatError::channel("down").is_payment());
    }

    #[test]
    fn display_includes_context() {
        let err = BizchatError::NotFound {
            entity: "transaction",
            id: "txn-1".into(),
        };
        assert_eq!(err.to_string(), "transaction not found: txn-1");
        assert_eq!(
            BizchatError::SignatureMismatch.to_string(),
            "signature mismatch"
        );
    }
}
