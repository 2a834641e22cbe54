// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook endpoints.
//!
//! Each handler authenticates the request, parses and normalizes the body,
//! and rejects anything malformed with a 4xx before the dispatcher sees it.
//! Accepted messages are acknowledged immediately and dispatched on the
//! gateway's task tracker; processing failures only reach the logs.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bizchat_core::types::StandardizedMessage;
use bizchat_core::webhook::detect_sms_payload;
use bizchat_core::{BizchatError, WebhookPayload};
use bizchat_payment::PaymentCallback;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::handlers::error_response;
use crate::metrics::record_webhook;
use crate::server::GatewayState;

/// Shared-secret header for the SMS and payment callback webhooks.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

const EMPTY_TWIML: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>";

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Compare an optional configured secret with the request header.
fn secret_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    match expected.filter(|s| !s.is_empty()) {
        None => true,
        Some(expected) => header_str(headers, WEBHOOK_SECRET_HEADER)
            .is_some_and(|given| bool::from(given.as_bytes().ct_eq(expected.as_bytes()))),
    }
}

fn rejection(e: &BizchatError) -> Response {
    match e {
        BizchatError::SignatureMismatch => {
            error_response(StatusCode::UNAUTHORIZED, "invalid signature")
        }
        BizchatError::InvalidPayload(msg) => error_response(StatusCode::BAD_REQUEST, msg.clone()),
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Normalize with the adapter registered for the payload's channel.
fn normalize(
    state: &GatewayState,
    payload: &WebhookPayload,
) -> Result<Vec<StandardizedMessage>, BizchatError> {
    state
        .dispatcher
        .context()
        .channels
        .process_incoming(payload)
}

/// Hand messages to the dispatcher after the response has been decided.
fn spawn_dispatch(state: &GatewayState, messages: Vec<StandardizedMessage>) {
    if messages.is_empty() {
        return;
    }
    let dispatcher = state.dispatcher.clone();
    state.tracker.spawn(async move {
        for message in messages {
            let id = message.id.clone();
            match dispatcher.dispatch(message).await {
                Ok(outcome) => debug!(message_id = %id, ?outcome, "message dispatched"),
                // Already logged, audited and apologised for by the dispatcher.
                Err(e) => debug!(message_id = %id, error = %e, "message dispatch failed"),
            }
        }
    });
}

/// GET /webhooks/whatsapp
///
/// Echoes `hub.challenge` when the verify token matches, 403 otherwise.
pub async fn verify_whatsapp(
    State(state): State<GatewayState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let expected = state.dispatcher.context().config.whatsapp.verify_token.clone();
    match bizchat_whatsapp::verify_subscription(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
        expected.as_deref(),
    ) {
        Some(challenge) => {
            info!("whatsapp webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!(mode = ?query.mode, "whatsapp webhook verification rejected");
            (StatusCode::FORBIDDEN, "verification failed").into_response()
        }
    }
}

/// POST /webhooks/whatsapp
pub async fn receive_whatsapp(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_webhook("whatsapp");

    let config = &state.dispatcher.context().config;
    let Some(secret) = config.whatsapp.app_secret.as_deref().filter(|s| !s.is_empty()) else {
        warn!("whatsapp.app_secret is not configured, rejecting webhook");
        return error_response(StatusCode::UNAUTHORIZED, "signature validation unavailable");
    };
    if let Err(e) = bizchat_whatsapp::verify_signature(
        secret,
        &body,
        header_str(&headers, bizchat_whatsapp::verify::SIGNATURE_HEADER),
    ) {
        warn!("whatsapp webhook signature mismatch");
        return rejection(&e);
    }

    let messages = match WebhookPayload::whatsapp_from_json(&body)
        .and_then(|payload| normalize(&state, &payload))
    {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "rejecting whatsapp webhook");
            return rejection(&e);
        }
    };

    debug!(count = messages.len(), "whatsapp webhook accepted");
    spawn_dispatch(&state, messages);
    StatusCode::OK.into_response()
}

/// POST /webhooks/twilio
///
/// Answers with empty TwiML; replies go out through the REST API.
pub async fn receive_twilio(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_webhook("twilio");

    let config = &state.dispatcher.context().config;
    if config.twilio.validate_signatures {
        let Some(auth_token) = config.twilio.auth_token.as_deref() else {
            return error_response(StatusCode::UNAUTHORIZED, "signature validation unavailable");
        };
        let params: Vec<(String, String)> = match serde_urlencoded::from_bytes(&body) {
            Ok(params) => params,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
        };
        let url = format!("{}/webhooks/twilio", config.server.effective_public_url());
        if let Err(e) = bizchat_sms::signature::verify_signature(
            auth_token,
            &url,
            &params,
            header_str(&headers, bizchat_sms::signature::SIGNATURE_HEADER),
        ) {
            warn!("twilio webhook signature mismatch");
            return rejection(&e);
        }
    }

    let messages = match WebhookPayload::twilio_from_form(&body)
        .and_then(|payload| normalize(&state, &payload))
    {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "rejecting twilio webhook");
            return rejection(&e);
        }
    };

    spawn_dispatch(&state, messages);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/xml")],
        EMPTY_TWIML,
    )
        .into_response()
}

/// POST /webhooks/sms
///
/// Accepts MSG91, Twilio SMS and SNS deliveries on one URL.
pub async fn receive_sms(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_webhook("sms");

    let config = &state.dispatcher.context().config;
    if !secret_matches(config.sms.webhook_secret.as_deref(), &headers) {
        warn!("sms webhook secret mismatch");
        return error_response(StatusCode::UNAUTHORIZED, "invalid webhook secret");
    }

    let messages = match detect_sms_payload(
        |name| headers.contains_key(name),
        header_str(&headers, header::CONTENT_TYPE.as_str()),
        &body,
    )
    .and_then(|payload| {
        debug!(provider = payload.provider(), "sms webhook provider detected");
        normalize(&state, &payload)
    }) {
        Ok(messages) => messages,
        Err(e) => {
            warn!(error = %e, "rejecting sms webhook");
            return rejection(&e);
        }
    };

    spawn_dispatch(&state, messages);
    StatusCode::OK.into_response()
}

/// POST /webhooks/upi
///
/// Applies the callback before answering so the provider sees whether the
/// reference was known.
pub async fn receive_payment_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record_webhook("upi");

    let config = &state.dispatcher.context().config;
    if !secret_matches(config.payment.callback_secret.as_deref(), &headers) {
        warn!("payment callback secret mismatch");
        return error_response(StatusCode::UNAUTHORIZED, "invalid webhook secret");
    }

    let callback: PaymentCallback = match serde_json::from_slice(&body) {
        Ok(callback) => callback,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("invalid callback: {e}")),
    };

    match state.dispatcher.handle_payment_callback(&callback).await {
        Ok(outcome) => {
            let txn = &outcome.change.transaction;
            (
                StatusCode::OK,
                axum::Json(serde_json::json!({
                    "transaction_id": txn.id,
                    "status": txn.status.to_string(),
                    "applied": outcome.change.applied,
                    "invoice_number": outcome.invoice.as_ref().map(|i| i.invoice_number.clone()),
                })),
            )
                .into_response()
        }
        Err(BizchatError::NotFound { entity, id }) => {
            warn!(reference = %id, "payment callback for unknown {entity}");
            error_response(StatusCode::NOT_FOUND, format!("{entity} not found"))
        }
        Err(BizchatError::InvalidTransition { from, to }) => {
            warn!(%from, %to, "payment callback rejected");
            error_response(StatusCode::CONFLICT, format!("cannot move from {from} to {to}"))
        }
        Err(e) => rejection(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_secret_accepts_everything() {
        assert!(secret_matches(None, &HeaderMap::new()));
        assert!(secret_matches(Some(""), &HeaderMap::new()));
    }

    #[test]
    fn configured_secret_must_match_header() {
        let mut headers = HeaderMap::new();
        assert!(!secret_matches(Some("s3cret"), &headers));
        headers.insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(!secret_matches(Some("s3cret"), &headers));
        headers.insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static("s3cre"));
        assert!(!secret_matches(Some("s3cret"), &headers));
        headers.insert(WEBHOOK_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(secret_matches(Some("s3cret"), &headers));
    }

    #[test]
    fn signature_mismatch_maps_to_unauthorized() {
        let response = rejection(&BizchatError::SignatureMismatch);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = rejection(&BizchatError::InvalidPayload("bad".into()));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
