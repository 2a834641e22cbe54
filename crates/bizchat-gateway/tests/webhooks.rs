// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router-level tests for the webhook endpoints.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bizchat_core::payment::TransactionStatus;
use bizchat_core::types::ChannelType;
use bizchat_gateway::{GatewayState, HealthState, build_router};
use bizchat_test_utils::{TestHarness, TestHarnessBuilder};
use tower::ServiceExt;

const APP_SECRET: &str = "app-secret";
const VERIFY_TOKEN: &str = "verify-me";

struct Gateway {
    harness: TestHarness,
    state: GatewayState,
    app: Router,
}

impl Gateway {
    async fn with(builder: TestHarnessBuilder) -> Self {
        let harness = builder.build().await.unwrap();
        let state = GatewayState::new(harness.dispatcher.clone(), HealthState::new(None));
        let app = build_router(state.clone());
        Self { harness, state, app }
    }

    async fn new() -> Self {
        Self::with(TestHarness::builder().with_config(|c| {
            c.whatsapp.verify_token = Some(VERIFY_TOKEN.into());
            c.whatsapp.app_secret = Some(APP_SECRET.into());
        }))
        .await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Wait for every acknowledged webhook to finish processing.
    async fn drain(&self) {
        self.state.tracker.close();
        self.state.tracker.wait().await;
    }
}

fn whatsapp_body(text: &str, id: &str) -> String {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "1234",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "15550001111", "phone_number_id": "pn-1"},
                    "contacts": [{"wa_id": "919876543210", "profile": {"name": "Ravi"}}],
                    "messages": [{
                        "from": "919876543210",
                        "id": id,
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": text}
                    }]
                }
            }]
        }]
    })
    .to_string()
}

fn signed_whatsapp(body: String) -> Request<Body> {
    let signature = bizchat_whatsapp::verify::sign_body(APP_SECRET, body.as_bytes()).unwrap();
    Request::post("/webhooks/whatsapp")
        .header("content-type", "application/json")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn verification_echoes_challenge() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .call(
            Request::get(format!(
                "/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=12345"
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "12345");
}

#[tokio::test]
async fn verification_with_wrong_token_is_forbidden() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(
            Request::get("/webhooks/whatsapp?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unsigned_whatsapp_event_is_unauthorized() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(
            Request::post("/webhooks/whatsapp")
                .header("content-type", "application/json")
                .body(Body::from(whatsapp_body("hi", "wamid.1")))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    gw.drain().await;
    assert_eq!(gw.harness.whatsapp.sent_count().await, 0);
}

#[tokio::test]
async fn whatsapp_event_without_app_secret_is_unauthorized() {
    let gw = Gateway::with(TestHarness::builder().with_config(|c| {
        c.whatsapp.verify_token = Some(VERIFY_TOKEN.into());
        c.whatsapp.app_secret = None;
    }))
    .await;
    let (status, _) = gw
        .call(
            Request::post("/webhooks/whatsapp")
                .header("content-type", "application/json")
                .body(Body::from(whatsapp_body("how much", "wamid.1")))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    gw.drain().await;
    assert_eq!(gw.harness.whatsapp.sent_count().await, 0);
}

#[tokio::test]
async fn signed_whatsapp_event_is_acknowledged_then_answered() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(signed_whatsapp(whatsapp_body("how much for product A", "wamid.1")))
        .await;
    assert_eq!(status, StatusCode::OK);

    gw.drain().await;
    let texts = gw.harness.whatsapp.sent_texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("GST"));
    assert_eq!(gw.harness.whatsapp.sent_messages().await[0].to, "+919876543210");
}

#[tokio::test]
async fn redelivered_whatsapp_event_is_answered_once() {
    let gw = Gateway::new().await;
    for _ in 0..2 {
        let (status, _) = gw
            .call(signed_whatsapp(whatsapp_body("hello", "wamid.same")))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    gw.drain().await;
    assert_eq!(gw.harness.whatsapp.sent_count().await, 1);
}

#[tokio::test]
async fn malformed_whatsapp_body_is_bad_request() {
    let gw = Gateway::new().await;
    let (status, body) = gw.call(signed_whatsapp("{not json".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("error"));
}

#[tokio::test]
async fn status_only_notification_is_acknowledged_silently() {
    let gw = Gateway::new().await;
    let body = serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{"id": "1", "changes": [{"field": "messages", "value": {
            "messaging_product": "whatsapp",
            "statuses": [{"id": "wamid.9", "status": "delivered", "recipient_id": "919876543210"}]
        }}]}]
    })
    .to_string();
    let (status, _) = gw.call(signed_whatsapp(body)).await;
    assert_eq!(status, StatusCode::OK);
    gw.drain().await;
    assert_eq!(gw.harness.whatsapp.sent_count().await, 0);
}

#[tokio::test]
async fn twilio_sms_gets_twiml_and_reply() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .call(
            Request::post("/webhooks/twilio")
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(
                    "From=%2B919876543210&To=%2B15550001111&Body=2&MessageSid=SM1&NumMedia=0",
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Response></Response>"));

    gw.drain().await;
    let texts = gw.harness.sms.sent_texts().await;
    assert!(texts[0].starts_with("Prices:"));
}

#[tokio::test]
async fn twilio_whatsapp_prefix_routes_to_whatsapp() {
    let gw = Gateway::new().await;
    gw.call(
        Request::post("/webhooks/twilio")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(
                "From=whatsapp%3A%2B919876543210&Body=2&MessageSid=SM2&NumMedia=0",
            ))
            .unwrap(),
    )
    .await;
    gw.drain().await;
    assert_eq!(gw.harness.sms.sent_count().await, 0);
    // "2" is not a menu choice on WhatsApp.
    let texts = gw.harness.whatsapp.sent_texts().await;
    assert!(texts[0].contains("How can I help you today?"));
}

#[tokio::test]
async fn twilio_signature_enforced_when_enabled() {
    let gw = Gateway::with(TestHarness::builder().with_config(|c| {
        c.twilio.validate_signatures = true;
        c.twilio.auth_token = Some("twilio-token".into());
    }))
    .await;
    let form = "From=%2B919876543210&Body=hi&MessageSid=SM3";

    let (status, _) = gw
        .call(
            Request::post("/webhooks/twilio")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("x-twilio-signature", "bogus")
                .body(Body::from(form))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let params = vec![
        ("From".to_string(), "+919876543210".to_string()),
        ("Body".to_string(), "hi".to_string()),
        ("MessageSid".to_string(), "SM3".to_string()),
    ];
    let signature = bizchat_sms::signature::compute_signature(
        "twilio-token",
        "https://bizchat.test/webhooks/twilio",
        &params,
    )
    .unwrap();
    let (status, _) = gw
        .call(
            Request::post("/webhooks/twilio")
                .header("content-type", "application/x-www-form-urlencoded")
                .header("x-twilio-signature", signature)
                .body(Body::from(form))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn msg91_sms_payment_sends_link() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(
            Request::post("/webhooks/sms")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"sender":"919876543210","content":"pay","requestId":"req-1"}"#,
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    gw.drain().await;

    let business_id = gw.harness.ctx.config.business.default_business_id.clone();
    let txns = gw.harness.storage.list_transactions(&business_id).await.unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].status, TransactionStatus::Pending);
    let texts = gw.harness.sms.sent_texts().await;
    assert!(texts[0].contains(&txns[0].id));
}

#[tokio::test]
async fn sms_webhook_secret_is_checked() {
    let gw = Gateway::with(TestHarness::builder().with_config(|c| {
        c.sms.webhook_secret = Some("sms-secret".into());
    }))
    .await;
    let body = r#"{"sender":"919876543210","content":"hi"}"#;

    let (status, _) = gw
        .call(
            Request::post("/webhooks/sms")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = gw
        .call(
            Request::post("/webhooks/sms")
                .header("content-type", "application/json")
                .header("x-webhook-secret", "sms-secret")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unrecognised_sms_payload_is_bad_request() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(
            Request::post("/webhooks/sms")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"hello":"world"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upi_callback_completes_and_invoices() {
    let gw = Gateway::new().await;
    gw.harness
        .send_text(ChannelType::Sms, "+919876543210", "pay")
        .await
        .unwrap();
    let business_id = gw.harness.ctx.config.business.default_business_id.clone();
    let txn = gw
        .harness
        .storage
        .list_transactions(&business_id)
        .await
        .unwrap()
        .remove(0);

    let body = serde_json::json!({
        "reference_id": txn.reference_id,
        "status": "SUCCESS",
        "upi_txn_id": "UPI42"
    })
    .to_string();
    let (status, response) = gw
        .call(
            Request::post("/webhooks/upi")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["applied"], true);
    assert!(json["invoice_number"].as_str().unwrap().starts_with("INV-"));

    let stored = gw.harness.storage.get_transaction(&txn.id).await.unwrap().unwrap();
    assert_eq!(stored.provider_txn_id.as_deref(), Some("UPI42"));
}

#[tokio::test]
async fn upi_callback_for_unknown_reference_is_not_found() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(
            Request::post("/webhooks/upi")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"reference_id":"nope","status":"SUCCESS"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn qr_image_is_served_for_upi_transactions() {
    let gw = Gateway::new().await;
    gw.harness
        .send_text(ChannelType::WhatsApp, "+919876543210", "pay")
        .await
        .unwrap();
    let business_id = gw.harness.ctx.config.business.default_business_id.clone();
    let txn = gw
        .harness
        .storage
        .list_transactions(&business_id)
        .await
        .unwrap()
        .remove(0);

    let response = gw
        .app
        .clone()
        .oneshot(
            Request::get(format!("/pay/{}/qr.svg", txn.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/svg+xml");

    let (status, _) = gw
        .call(Request::get("/pay/missing/qr.svg").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_channels() {
    let gw = Gateway::new().await;
    let (status, body) = gw
        .call(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["channels"], serde_json::json!(["sms", "whatsapp"]));

    gw.harness.sms.set_failing(true);
    let (status, body) = gw
        .call(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("degraded"));
}

#[tokio::test]
async fn metrics_disabled_without_recorder() {
    let gw = Gateway::new().await;
    let (status, _) = gw
        .call(Request::get("/metrics").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
