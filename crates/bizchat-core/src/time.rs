// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp normalization.
//!
//! Providers report event time as epoch seconds (WhatsApp), epoch millis,
//! RFC 3339 (SNS) or `YYYY-MM-DD HH:MM:SS` (MSG91). Everything becomes a UTC
//! `DateTime` at ingestion and is persisted in one ISO 8601 format.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Storage format for every persisted timestamp.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Epoch values with at least this many digits are milliseconds.
const MILLIS_DIGITS: usize = 13;

/// Parse any supported provider timestamp.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        let value: i64 = raw.parse().ok()?;
        return if raw.len() >= MILLIS_DIGITS {
            Utc.timestamp_millis_opt(value).single()
        } else {
            Utc.timestamp_opt(value, 0).single()
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a provider timestamp, falling back to the receipt time.
pub fn normalize_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_timestamp).unwrap_or_else(Utc::now)
}

pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.format(ISO_FORMAT).to_string()
}

pub fn now_iso() -> String {
    to_iso(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_seconds_and_millis() {
        let secs = parse_timestamp("1700000000").unwrap();
        let millis = parse_timestamp("1700000000000").unwrap();
        assert_eq!(secs, millis);
        assert_eq!(to_iso(&secs), "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn rfc3339_and_msg91_formats() {
        let rfc = parse_timestamp("2023-11-14T22:13:20.000Z").unwrap();
        let msg91 = parse_timestamp("2023-11-14 22:13:20").unwrap();
        assert_eq!(rfc, msg91);
        let offset = parse_timestamp("2023-11-15T03:43:20+05:30").unwrap();
        assert_eq!(offset, rfc);
    }

    #[test]
    fn garbage_falls_back_to_now() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        let before = Utc::now();
        let normalized = normalize_timestamp(Some("not a time"));
        assert!(normalized >= before);
    }
}
