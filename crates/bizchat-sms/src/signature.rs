// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `X-Twilio-Signature` validation.
//!
//! Twilio signs the full webhook URL followed by every POST parameter as
//! `key` + `value`, sorted by key, with HMAC-SHA1 keyed by the auth token,
//! and sends the base64 digest.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bizchat_core::BizchatError;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

fn mac_for(auth_token: &str, url: &str, params: &[(String, String)]) -> Result<HmacSha1, BizchatError> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|e| BizchatError::Internal(format!("HMAC key error: {e}")))?;
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// The signature Twilio would send for this request.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, BizchatError> {
    let mac = mac_for(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a request signature in constant time.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: Option<&str>,
) -> Result<(), BizchatError> {
    let provided = signature
        .map(str::trim)
        .and_then(|s| STANDARD.decode(s).ok())
        .ok_or(BizchatError::SignatureMismatch)?;
    mac_for(auth_token, url, params)?
        .verify_slice(&provided)
        .map_err(|_| BizchatError::SignatureMismatch)
}
