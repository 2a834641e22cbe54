// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical contact form.
//!
//! Every contact is stored and looked up as E.164 with a leading `+`
//! (`+919876543210`). Adapters strip or re-add provider decorations at the
//! edges: WhatsApp Cloud and MSG91 omit the `+`, Twilio WhatsApp prefixes
//! `whatsapp:`.

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Normalize a provider-native number into canonical form.
///
/// Returns an empty string when the input holds no digits.
pub fn canonical_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = match trimmed.get(..WHATSAPP_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(WHATSAPP_PREFIX) => {
            &trimmed[WHATSAPP_PREFIX.len()..]
        }
        _ => trimmed,
    };

    let digits: String = without_prefix
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return String::new();
    }

    let has_plus = without_prefix.trim_start().starts_with('+');
    let digits = match digits.strip_prefix("00") {
        Some(rest) if !has_plus => rest.to_string(),
        _ => digits,
    };
    format!("+{digits}")
}

/// Canonical number without the leading `+`, for providers that reject it.
pub fn without_plus(canonical: &str) -> &str {
    canonical.strip_prefix('+').unwrap_or(canonical)
}

/// Twilio WhatsApp address for a canonical number.
pub fn whatsapp_address(canonical: &str) -> String {
    format!("{WHATSAPP_PREFIX}{canonical}")
}

/// Whether a raw Twilio `From` value addresses a WhatsApp user.
pub fn is_whatsapp_address(raw: &str) -> bool {
    raw.trim()
        .get(..WHATSAPP_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(WHATSAPP_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_provider_forms() {
        assert_eq!(canonical_phone("919876543210"), "+919876543210");
        assert_eq!(canonical_phone("+919876543210"), "+919876543210");
        assert_eq!(canonical_phone("whatsapp:+919876543210"), "+919876543210");
        assert_eq!(canonical_phone("WhatsApp:+14155238886"), "+14155238886");
        assert_eq!(canonical_phone(" +1 (415) 523-8886 "), "+14155238886");
        assert_eq!(canonical_phone("00919876543210"), "+919876543210");
        assert_eq!(canonical_phone("abc"), "");
    }

    #[test]
    fn decorations_are_symmetric() {
        let canonical = canonical_phone("whatsapp:+919876543210");
        assert_eq!(canonical_phone(&whatsapp_address(&canonical)), canonical);
        assert_eq!(canonical_phone(without_plus(&canonical)), canonical);
        assert!(is_whatsapp_address(&whatsapp_address(&canonical)));
        assert!(!is_whatsapp_address(&canonical));
    }

    proptest::proptest! {
        #[test]
        fn canonicalization_is_idempotent(digits in "[1-9][0-9]{6,13}") {
            let once = canonical_phone(&digits);
            proptest::prop_assert_eq!(canonical_phone(&once), once.clone());
            proptest::prop_assert_eq!(canonical_phone(&whatsapp_address(&once)), once);
        }
    }
}
