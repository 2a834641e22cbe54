// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook authentication for the Cloud API.
//!
//! Meta signs each POST body with the app secret and sends
//! `X-Hub-Signature-256: sha256=<hex>`. Subscription setup is a GET
//! handshake that must echo `hub.challenge` when the verify token matches.

use bizchat_core::BizchatError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Check `X-Hub-Signature-256` against the raw request body.
///
/// The comparison runs in constant time via [`Mac::verify_slice`].
pub fn verify_signature(
    app_secret: &str,
    body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), BizchatError> {
    let header = signature_header.ok_or(BizchatError::SignatureMismatch)?;
    let hex_sig = header
        .trim()
        .strip_prefix("sha256=")
        .ok_or(BizchatError::SignatureMismatch)?;
    let provided = hex::decode(hex_sig).map_err(|_| BizchatError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| BizchatError::Internal(format!("HMAC key error: {e}")))?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| BizchatError::SignatureMismatch)
}

/// Compute the header value Meta would send for `body`. Used by tests and
/// local tooling that replays webhooks.
pub fn sign_body(app_secret: &str, body: &[u8]) -> Result<String, BizchatError> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| BizchatError::Internal(format!("HMAC key error: {e}")))?;
    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Validate the GET subscription handshake and return the challenge to echo.
///
/// Returns `None` when the mode is not `subscribe`, the token does not match,
/// or no verify token is configured.
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: Option<&str>,
) -> Option<&'a str> {
    let expected = expected_token.filter(|t| !t.is_empty())?;
    if mode != Some("subscribe") || token != Some(expected) {
        return None;
    }
    challenge
}
