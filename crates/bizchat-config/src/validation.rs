// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and credentials required by
//! the selected providers.

use crate::diagnostic::ConfigError;
use crate::model::{BizchatConfig, SmsProvider, WhatsAppProvider};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BizchatConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.port == 0 {
        errors.push(validation("server.port must be greater than 0"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    if config.business.default_business_id.trim().is_empty() {
        errors.push(validation("business.default_business_id must not be empty"));
    }

    if config.payment.default_amount <= 0 {
        errors.push(validation(format!(
            "payment.default_amount must be positive, got {}",
            config.payment.default_amount
        )));
    }

    if config.payment.currency.len() != 3
        || !config.payment.currency.chars().all(|c| c.is_ascii_uppercase())
    {
        errors.push(validation(format!(
            "payment.currency must be an ISO 4217 code like `INR`, got `{}`",
            config.payment.currency
        )));
    }

    if !config.payment.link_base.starts_with("http") {
        errors.push(validation("payment.link_base must be an http(s) URL"));
    }

    if config.sms.max_length < 20 {
        errors.push(validation(format!(
            "sms.max_length must be at least 20, got {}",
            config.sms.max_length
        )));
    }

    if config.whatsapp.enabled {
        match config.whatsapp.provider {
            WhatsAppProvider::Cloud => {
                require(&mut errors, "whatsapp.phone_number_id", &config.whatsapp.phone_number_id);
                require(&mut errors, "whatsapp.access_token", &config.whatsapp.access_token);
                require(&mut errors, "whatsapp.verify_token", &config.whatsapp.verify_token);
                require(&mut errors, "whatsapp.app_secret", &config.whatsapp.app_secret);
            }
            WhatsAppProvider::Twilio => {
                require(&mut errors, "twilio.account_sid", &config.twilio.account_sid);
                require(&mut errors, "twilio.auth_token", &config.twilio.auth_token);
                require(&mut errors, "twilio.whatsapp_number", &config.twilio.whatsapp_number);
            }
        }
    }

    if config.sms.enabled {
        match config.sms.provider {
            SmsProvider::Msg91 => {
                require(&mut errors, "sms.msg91_auth_key", &config.sms.msg91_auth_key);
                require(&mut errors, "sms.msg91_flow_id", &config.sms.msg91_flow_id);
            }
            SmsProvider::Twilio => {
                require(&mut errors, "twilio.account_sid", &config.twilio.account_sid);
                require(&mut errors, "twilio.auth_token", &config.twilio.auth_token);
                require(&mut errors, "twilio.sms_number", &config.twilio.sms_number);
            }
        }
    }

    if config.twilio.validate_signatures && config.twilio.auth_token.is_none() {
        errors.push(validation(
            "twilio.validate_signatures requires twilio.auth_token",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

fn require(errors: &mut Vec<ConfigError>, key: &str, value: &Option<String>) {
    let missing = value.as_deref().is_none_or(|v| v.trim().is_empty());
    if missing && !errors.iter().any(|e| matches!(e, ConfigError::MissingKey { key: k } if k == key))
    {
        errors.push(ConfigError::MissingKey {
            key: key.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&BizchatConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = BizchatConfig::default();
        config.server.host = String::new();
        config.storage.database_path = "  ".into();
        config.payment.default_amount = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn enabled_cloud_whatsapp_requires_credentials() {
        let mut config = BizchatConfig::default();
        config.whatsapp.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        let keys: Vec<String> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigError::MissingKey { key } => Some(key.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                "whatsapp.phone_number_id",
                "whatsapp.access_token",
                "whatsapp.verify_token",
                "whatsapp.app_secret"
            ]
        );
    }

    #[test]
    fn shared_twilio_credentials_reported_once() {
        let mut config = BizchatConfig::default();
        config.whatsapp.enabled = true;
        config.whatsapp.provider = WhatsAppProvider::Twilio;
        config.sms.enabled = true;
        config.sms.provider = SmsProvider::Twilio;
        let errors = validate_config(&config).unwrap_err();
        let sid_errors = errors
            .iter()
            .filter(|e| matches!(e, ConfigError::MissingKey { key } if key == "twilio.account_sid"))
            .count();
        assert_eq!(sid_errors, 1);
    }

    #[test]
    fn rejects_lowercase_currency() {
        let mut config = BizchatConfig::default();
        config.payment.currency = "inr".into();
        assert!(validate_config(&config).is_err());
    }
}
