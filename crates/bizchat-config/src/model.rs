// SPDX-FileCopyrightText: 2026 Bizchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Bizchat message router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use bizchat_core::ChannelType;
use serde::{Deserialize, Serialize};

const REDACTED: &str = "[redacted]";

/// Top-level Bizchat configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BizchatConfig {
    /// HTTP server and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fallback business for unmapped inbound numbers.
    #[serde(default)]
    pub business: BusinessConfig,

    /// WhatsApp channel settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Twilio account shared by the WhatsApp and SMS channels.
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// SMS channel settings.
    #[serde(default)]
    pub sms: SmsConfig,

    /// Payment bridge settings.
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Intent routing settings.
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl BizchatConfig {
    /// A copy with every credential replaced by `[redacted]`, for display.
    pub fn redacted(&self) -> Self {
        fn hide(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|_| REDACTED.to_string())
        }

        let mut copy = self.clone();
        copy.whatsapp.access_token = hide(&self.whatsapp.access_token);
        copy.whatsapp.verify_token = hide(&self.whatsapp.verify_token);
        copy.whatsapp.app_secret = hide(&self.whatsapp.app_secret);
        copy.twilio.auth_token = hide(&self.twilio.auth_token);
        copy.sms.msg91_auth_key = hide(&self.sms.msg91_auth_key);
        copy.sms.webhook_secret = hide(&self.sms.webhook_secret);
        copy.payment.stripe_secret_key = hide(&self.payment.stripe_secret_key);
        copy.payment.callback_secret = hide(&self.payment.callback_secret);
        copy
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the webhook server to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the webhook server to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Externally reachable base URL, used for QR image links.
    /// Defaults to `http://{host}:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl ServerConfig {
    pub fn effective_public_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            public_url: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("bizchat").join("bizchat.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("bizchat.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Fallback business used when an inbound number maps to no business.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessConfig {
    #[serde(default = "default_business_id")]
    pub default_business_id: String,

    #[serde(default = "default_business_name")]
    pub default_business_name: String,

    /// UPI payee for the fallback business, applied when it is first created.
    #[serde(default)]
    pub default_upi_id: Option<String>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            default_business_id: default_business_id(),
            default_business_name: default_business_name(),
            default_upi_id: None,
        }
    }
}

fn default_business_id() -> String {
    "00000000-0000-0000-0000-000000000000".to_string()
}

fn default_business_name() -> String {
    "BizChatAssist".to_string()
}

/// Which provider delivers WhatsApp messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhatsAppProvider {
    #[default]
    Cloud,
    Twilio,
}

/// WhatsApp channel configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: WhatsAppProvider,

    /// Cloud API phone number id.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Cloud API bearer token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Secret echoed back during the webhook verification handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256`. `None` skips signature checks.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_graph_api_base")]
    pub api_base: String,

    #[serde(default = "default_graph_api_version")]
    pub api_version: String,

    /// Send read receipts for inbound messages.
    #[serde(default)]
    pub mark_as_read: bool,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: WhatsAppProvider::default(),
            phone_number_id: None,
            access_token: None,
            verify_token: None,
            app_secret: None,
            api_base: default_graph_api_base(),
            api_version: default_graph_api_version(),
            mark_as_read: false,
        }
    }
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &self.access_token.as_ref().map(|_| REDACTED))
            .field("verify_token", &self.verify_token.as_ref().map(|_| REDACTED))
            .field("app_secret", &self.app_secret.as_ref().map(|_| REDACTED))
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("mark_as_read", &self.mark_as_read)
            .finish()
    }
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_api_version() -> String {
    "v17.0".to_string()
}

/// Twilio account configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwilioConfig {
    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender for WhatsApp messages, canonical form (`+14155238886`).
    #[serde(default)]
    pub whatsapp_number: Option<String>,

    /// Sender for SMS messages, canonical form.
    #[serde(default)]
    pub sms_number: Option<String>,

    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,

    /// Verify `X-Twilio-Signature` on inbound webhooks.
    #[serde(default)]
    pub validate_signatures: bool,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            whatsapp_number: None,
            sms_number: None,
            api_base: default_twilio_api_base(),
            validate_signatures: false,
        }
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| REDACTED))
            .field("whatsapp_number", &self.whatsapp_number)
            .field("sms_number", &self.sms_number)
            .field("api_base", &self.api_base)
            .field("validate_signatures", &self.validate_signatures)
            .finish()
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

/// Which provider delivers SMS messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmsProvider {
    #[default]
    Msg91,
    Twilio,
}

/// SMS channel configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub provider: SmsProvider,

    #[serde(default)]
    pub msg91_auth_key: Option<String>,

    #[serde(default = "default_msg91_sender_id")]
    pub msg91_sender_id: String,

    /// Flow whose single `VAR1` variable carries the message body.
    #[serde(default)]
    pub msg91_flow_id: Option<String>,

    #[serde(default = "default_msg91_api_base")]
    pub msg91_api_base: String,

    /// Shared secret expected in `x-webhook-secret`. `None` disables the check.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Longest SMS body sent through MSG91; longer bodies are truncated.
    #[serde(default = "default_sms_max_length")]
    pub max_length: usize,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: SmsProvider::default(),
            msg91_auth_key: None,
            msg91_sender_id: default_msg91_sender_id(),
            msg91_flow_id: None,
            msg91_api_base: default_msg91_api_base(),
            webhook_secret: None,
            max_length: default_sms_max_length(),
        }
    }
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field(
                "msg91_auth_key",
                &self.msg91_auth_key.as_ref().map(|_| REDACTED),
            )
            .field("msg91_sender_id", &self.msg91_sender_id)
            .field("msg91_flow_id", &self.msg91_flow_id)
            .field("msg91_api_base", &self.msg91_api_base)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| REDACTED),
            )
            .field("max_length", &self.max_length)
            .finish()
    }
}

fn default_msg91_sender_id() -> String {
    "BIZCHT".to_string()
}

fn default_msg91_api_base() -> String {
    "https://control.msg91.com".to_string()
}

fn default_sms_max_length() -> usize {
    160
}

/// Payment bridge configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    /// Base URL of the hosted payment page.
    #[serde(default = "default_link_base")]
    pub link_base: String,

    /// Amount in major units charged when no order context supplies one.
    #[serde(default = "default_amount")]
    pub default_amount: i64,

    #[serde(default = "default_currency")]
    pub currency: String,

    /// Payee name embedded in UPI QR codes when the business has none.
    #[serde(default = "default_payee_name")]
    pub payee_name: String,

    /// Stripe secret key. `None` leaves card payments unavailable.
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,

    /// Shared secret expected on payment provider callbacks.
    #[serde(default)]
    pub callback_secret: Option<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            link_base: default_link_base(),
            default_amount: default_amount(),
            currency: default_currency(),
            payee_name: default_payee_name(),
            stripe_secret_key: None,
            stripe_api_base: default_stripe_api_base(),
            callback_secret: None,
        }
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("link_base", &self.link_base)
            .field("default_amount", &self.default_amount)
            .field("currency", &self.currency)
            .field("payee_name", &self.payee_name)
            .field(
                "stripe_secret_key",
                &self.stripe_secret_key.as_ref().map(|_| REDACTED),
            )
            .field("stripe_api_base", &self.stripe_api_base)
            .field(
                "callback_secret",
                &self.callback_secret.as_ref().map(|_| REDACTED),
            )
            .finish()
    }
}

fn default_link_base() -> String {
    "https://pay.bizchatassist.com".to_string()
}

fn default_amount() -> i64 {
    499
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_payee_name() -> String {
    "BizChatAssist".to_string()
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

/// Intent routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Channels on which a bare positive integer is a menu selection.
    #[serde(default = "default_numeric_menu_channels")]
    pub numeric_menu_channels: Vec<ChannelType>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            numeric_menu_channels: default_numeric_menu_channels(),
        }
    }
}

fn default_numeric_menu_channels() -> Vec<ChannelType> {
    vec![ChannelType::Sms]
}
