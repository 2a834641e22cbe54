// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Card payments through Stripe PaymentIntents.

use std::time::Duration;

use async_trait::async_trait;
use bizchat_core::payment::{PaymentMethod, PaymentRequest, PaymentResult, TransactionStatus};
use bizchat_core::types::{AdapterType, HealthStatus};
use bizchat_core::{BizchatError, PaymentAdapter, PluginAdapter};
use dashmap::DashMap;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    next_action: Option<NextAction>,
}

#[derive(Debug, Deserialize)]
struct NextAction {
    #[serde(default)]
    redirect_to_url: Option<RedirectToUrl>,
}

#[derive(Debug, Deserialize)]
struct RedirectToUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Refund {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

pub struct StripeAdapter {
    client: reqwest::Client,
    api_base: String,
    authorization: HeaderValue,
    /// Transaction id to PaymentIntent id, needed for refunds.
    intents: DashMap<String, String>,
}

impl std::fmt::Debug for StripeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeAdapter")
            .field("api_base", &self.api_base)
            .field("secret_key", &"[redacted]")
            .field("intents", &self.intents.len())
            .finish()
    }
}

impl StripeAdapter {
    pub fn new(api_base: &str, secret_key: &str) -> Result<Self, BizchatError> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {secret_key}"))
            .map_err(|e| BizchatError::Config(format!("invalid Stripe secret key: {e}")))?;
        authorization.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BizchatError::Payment {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            authorization,
            intents: DashMap::new(),
        })
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<T, BizchatError> {
        let url = format!("{}{path}", self.api_base);
        let body = serde_urlencoded::to_string(fields).map_err(|e| BizchatError::Payment {
            message: format!("failed to encode Stripe form: {e}"),
            source: Some(Box::new(e)),
        })?;

        debug!(url = %url, "Stripe API POST");
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| BizchatError::Payment {
                message: format!("Stripe request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| BizchatError::Payment {
            message: format!("failed to read Stripe response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<StripeErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!(status = %status, detail = %detail, "Stripe API error");
            return Err(BizchatError::payment(format!(
                "Stripe API returned {status}: {detail}"
            )));
        }

        serde_json::from_str(&text).map_err(|e| BizchatError::Payment {
            message: format!("failed to parse Stripe response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl PluginAdapter for StripeAdapter {
    fn name(&self) -> &str {
        "stripe"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Payment
    }

    async fn health_check(&self) -> Result<HealthStatus, BizchatError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BizchatError> {
        Ok(())
    }
}

#[async_trait]
impl PaymentAdapter for StripeAdapter {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::CreditCard
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResult, BizchatError> {
        let amount = request.amount.minor.to_string();
        let currency = request.amount.currency.to_lowercase();
        let intent: PaymentIntent = self
            .post_form(
                "/v1/payment_intents",
                &[
                    ("amount", amount.as_str()),
                    ("currency", currency.as_str()),
                    ("description", request.description.as_str()),
                    ("metadata[transaction_id]", request.transaction_id.as_str()),
                    ("metadata[business_id]", request.business_id.as_str()),
                ],
            )
            .await?;

        info!(
            transaction_id = %request.transaction_id,
            payment_intent = %intent.id,
            "Stripe payment intent created"
        );
        self.intents
            .insert(request.transaction_id.clone(), intent.id.clone());

        let status = match intent.status.as_deref() {
            Some("succeeded") => TransactionStatus::Completed,
            Some("canceled") => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        };
        Ok(PaymentResult {
            transaction_id: request.transaction_id.clone(),
            status,
            redirect_url: intent
                .next_action
                .and_then(|a| a.redirect_to_url)
                .map(|r| r.url),
            provider_reference: Some(intent.id),
        })
    }

    async fn reverse_transaction(&self, transaction_id: &str) -> Result<bool, BizchatError> {
        let Some(intent_id) = self.intents.get(transaction_id).map(|e| e.value().clone()) else {
            warn!(transaction_id, "no Stripe payment intent known for transaction");
            return Ok(false);
        };
        let refund: Refund = self
            .post_form("/v1/refunds", &[("payment_intent", intent_id.as_str())])
            .await?;
        let accepted = !matches!(refund.status.as_deref(), Some("failed" | "canceled"));
        info!(transaction_id, payment_intent = %intent_id, accepted, "Stripe refund requested");
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizchat_core::payment::Money;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PaymentRequest {
        PaymentRequest {
            transaction_id: "txn-1".into(),
            business_id: "biz-1".into(),
            conversation_id: None,
            customer_phone: "+14155550100".into(),
            amount: Money::new(1999, "USD"),
            description: "Order".into(),
            country: Some("US".into()),
            tax: None,
        }
    }

    #[tokio::test]
    async fn creates_payment_intent_with_minor_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_1"))
            .and(body_string_contains("amount=1999"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains("metadata%5Btransaction_id%5D=txn-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_123",
                "status": "requires_payment_method"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = StripeAdapter::new(&server.uri(), "sk_test_1").unwrap();
        let result = adapter.process_payment(&request()).await.unwrap();
        assert_eq!(result.status, TransactionStatus::Pending);
        assert_eq!(result.provider_reference.as_deref(), Some("pi_123"));
    }

    #[tokio::test]
    async fn api_error_is_payment_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": { "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let adapter = StripeAdapter::new(&server.uri(), "sk_test_1").unwrap();
        let err = adapter.process_payment(&request()).await.unwrap_err();
        assert!(err.is_payment());
        assert!(err.to_string().contains("declined"));
    }

    #[tokio::test]
    async fn refund_uses_recorded_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_9", "status": "succeeded"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/refunds"))
            .and(body_string_contains("payment_intent=pi_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "re_1", "status": "succeeded"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = StripeAdapter::new(&server.uri(), "sk_test_1").unwrap();
        let result = adapter.process_payment(&request()).await.unwrap();
        assert_eq!(result.status, TransactionStatus::Completed);
        assert!(adapter.reverse_transaction("txn-1").await.unwrap());
        assert!(!adapter.reverse_transaction("txn-unknown").await.unwrap());
    }
}
