// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `{{key}}` placeholder substitution for message templates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("valid placeholder regex")
});

/// Substitute `{{key}}` placeholders. Unknown keys are left untouched.
pub fn render_template(template: &str, params: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            params
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_keys() {
        let out = render_template(
            "Hi {{name}}, your order {{ order_id }} ships today",
            &params(&[("name", "Asha"), ("order_id", "42")]),
        );
        assert_eq!(out, "Hi Asha, your order 42 ships today");
    }

    #[test]
    fn leaves_unknown_keys() {
        let out = render_template("Pay {{amount}} by {{date}}", &params(&[("amount", "₹499")]));
        assert_eq!(out, "Pay ₹499 by {{date}}");
    }
}
