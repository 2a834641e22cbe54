// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./bizchat.toml` > `~/.config/bizchat/bizchat.toml` > `/etc/bizchat/bizchat.toml`
//! with environment variable overrides via `BIZCHAT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BizchatConfig;

/// Sections that env vars may address, in the order they are tried.
const SECTIONS: &[&str] = &[
    "server", "storage", "business", "whatsapp", "twilio", "sms", "payment", "routing",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/bizchat/bizchat.toml` (system-wide)
/// 3. `~/.config/bizchat/bizchat.toml` (user XDG config)
/// 4. `./bizchat.toml` (local directory)
/// 5. `BIZCHAT_*` environment variables
pub fn load_config() -> Result<BizchatConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<BizchatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BizchatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BizchatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BizchatConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BizchatConfig::default()))
        .merge(Toml::file("/etc/bizchat/bizchat.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("bizchat/bizchat.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("bizchat.toml"))
        .merge(env_provider())
}

/// Map a prefix-stripped, lowercased env key to its dotted config path.
///
/// Only the first underscore after the section name becomes a dot, so
/// `whatsapp_access_token` maps to `whatsapp.access_token`.
pub fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

/// Uses `Env::map()` rather than `Env::split("_")` so that keys containing
/// underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("BIZCHAT_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("whatsapp_access_token"), "whatsapp.access_token");
        assert_eq!(map_env_key("sms_msg91_auth_key"), "sms.msg91_auth_key");
        assert_eq!(map_env_key("server_port"), "server.port");
        assert_eq!(
            map_env_key("business_default_business_id"),
            "business.default_business_id"
        );
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }
}
