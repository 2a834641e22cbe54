// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Graph API `/messages` endpoint.

use std::time::Duration;

use bizchat_core::BizchatError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Authenticated Graph API client bound to one business phone number.
#[derive(Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    messages_url: String,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("messages_url", &self.messages_url)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl GraphClient {
    pub fn new(
        api_base: &str,
        api_version: &str,
        phone_number_id: &str,
        access_token: &str,
    ) -> Result<Self, BizchatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|e| {
                BizchatError::Config(format!("invalid WhatsApp access token header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BizchatError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/{api_version}/{phone_number_id}/messages",
                api_base.trim_end_matches('/')
            ),
        })
    }

    /// POST a message body. Returns the `wamid` of the accepted message.
    pub async fn post_message(
        &self,
        body: &serde_json::Value,
    ) -> Result<Option<String>, BizchatError> {
        debug!(url = %self.messages_url, "WhatsApp API POST /messages");

        let response = self
            .client
            .post(&self.messages_url)
            .json(body)
            .send()
            .await
            .map_err(|e| BizchatError::Channel {
                message: format!("WhatsApp request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| BizchatError::Channel {
            message: format!("failed to read WhatsApp response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(err) => match err.error.code {
                    Some(code) => format!("{} (code {code})", err.error.message),
                    None => err.error.message,
                },
                Err(_) => text,
            };
            warn!(status = %status, detail = %detail, "WhatsApp API error");
            return Err(BizchatError::channel(format!(
                "WhatsApp API returned {status}: {detail}"
            )));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| BizchatError::Channel {
                message: format!("failed to parse WhatsApp response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.messages.into_iter().next().map(|m| m.id))
    }
}

pub fn text_body(to: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": { "body": text }
    })
}

pub fn image_body(to: &str, url: &str, caption: Option<&str>) -> serde_json::Value {
    let mut image = serde_json::json!({ "link": url });
    if let Some(caption) = caption {
        image["caption"] = caption.into();
    }
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "image",
        "image": image
    })
}

pub fn document_body(
    to: &str,
    url: &str,
    filename: Option<&str>,
    caption: Option<&str>,
) -> serde_json::Value {
    let mut document = serde_json::json!({ "link": url });
    if let Some(filename) = filename {
        document["filename"] = filename.into();
    }
    if let Some(caption) = caption {
        document["caption"] = caption.into();
    }
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "document",
        "document": document
    })
}

/// Native template message. Parameters fill the body placeholders in order.
pub fn template_body(
    to: &str,
    name: &str,
    language: &str,
    parameters: &[&str],
) -> serde_json::Value {
    let mut template = serde_json::json!({
        "name": name,
        "language": { "code": language }
    });
    if !parameters.is_empty() {
        let params: Vec<serde_json::Value> = parameters
            .iter()
            .map(|text| serde_json::json!({ "type": "text", "text": text }))
            .collect();
        template["components"] = serde_json::json!([
            { "type": "body", "parameters": params }
        ]);
    }
    serde_json::json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "template",
        "template": template
    })
}

pub fn read_receipt_body(message_id: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "status": "read",
        "message_id": message_id
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn post_message_returns_wamid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/pn-1/messages"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({"type": "text"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "contacts": [{"input": "919876543210", "wa_id": "919876543210"}],
                "messages": [{"id": "wamid.HBgL"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphClient::new(&server.uri(), "v17.0", "pn-1", "test-token").unwrap();
        let id = client
            .post_message(&text_body("919876543210", "hello"))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("wamid.HBgL"));
    }

    #[tokio::test]
    async fn api_error_is_reported_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid parameter", "code": 100}
            })))
            .mount(&server)
            .await;

        let client = GraphClient::new(&server.uri(), "v17.0", "pn-1", "t").unwrap();
        let err = client
            .post_message(&text_body("1", "x"))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invalid parameter"), "{msg}");
        assert!(msg.contains("code 100"), "{msg}");
    }

    #[test]
    fn template_body_includes_parameters_in_order() {
        let body = template_body("1", "payment_request", "en_IN", &["Asha", "499"]);
        let params = &body["template"]["components"][0]["parameters"];
        assert_eq!(params[0]["text"], "Asha");
        assert_eq!(params[1]["text"], "499");
    }

    #[test]
    fn template_without_parameters_omits_components() {
        let body = template_body("1", "hello_world", "en_US", &[]);
        assert!(body["template"].get("components").is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let client = GraphClient::new("https://graph.facebook.com", "v17.0", "pn", "secret").unwrap();
        let out = format!("{client:?}");
        assert!(!out.contains("secret"));
        assert!(out.contains("[redacted]"));
    }
}
