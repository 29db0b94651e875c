//! Alert configuration types.

use pricewatch_core::{mask, CrossingDirection, ExchangeCredentials, Subject};
use std::fmt;
use thiserror::Error;

/// Default minutes between two alerts for the same bot.
pub const DEFAULT_RATE_LIMIT_MINUTES: i64 = 60;

/// Default rate-limit key.
pub const DEFAULT_BOT_NAME: &str = "crypto-alerts";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Rate-limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Whether alerts are gated by the stored last-alert time.
    pub enabled: bool,
    /// Minimum minutes between two alerts.
    pub window_minutes: i64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window_minutes: DEFAULT_RATE_LIMIT_MINUTES,
        }
    }
}

/// Immutable configuration for one alert invocation.
#[derive(Clone)]
pub struct AlertConfig {
    /// Coin or gas fees
    pub subject: Subject,
    /// Threshold price (USD) or fee (gwei)
    pub threshold: f64,
    /// Side of the threshold that fires
    pub direction: CrossingDirection,
    pub rate_limit: RateLimitSettings,
    /// Rate-limit key
    pub bot_name: String,
    /// Webhook URL receiving the alert
    pub webhook_url: String,
    /// Exchange API credentials; switches coin lookups to the signed API
    pub exchange_credentials: Option<ExchangeCredentials>,
    /// Gas provider API key
    pub gas_api_key: Option<String>,
}

impl fmt::Debug for AlertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertConfig")
            .field("subject", &self.subject)
            .field("threshold", &self.threshold)
            .field("direction", &self.direction)
            .field("rate_limit", &self.rate_limit)
            .field("bot_name", &self.bot_name)
            .field("webhook_url", &mask(&self.webhook_url))
            .field("exchange_credentials", &self.exchange_credentials)
            .field("gas_api_key", &self.gas_api_key.as_deref().map(mask))
            .finish()
    }
}

impl AlertConfig {
    /// Create a config with defaults for everything but the essentials.
    pub fn new(subject: Subject, threshold: f64, webhook_url: impl Into<String>) -> Self {
        Self {
            subject,
            threshold,
            direction: CrossingDirection::default(),
            rate_limit: RateLimitSettings::default(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
            webhook_url: webhook_url.into(),
            exchange_credentials: None,
            gas_api_key: None,
        }
    }

    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let subject = get("CRYPTOCURRENCY")
            .map(|raw| Subject::parse(&raw))
            .ok_or(ConfigError::Missing("CRYPTOCURRENCY"))?;

        let threshold_raw = get("ALERT_PRICE").ok_or(ConfigError::Missing("ALERT_PRICE"))?;
        let threshold = threshold_raw
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| ConfigError::Invalid {
                key: "ALERT_PRICE",
                value: threshold_raw.clone(),
                reason: "expected a finite number".to_string(),
            })?;

        let direction = match get("ALERT_DIRECTION") {
            Some(raw) => raw.parse::<CrossingDirection>().map_err(|e| ConfigError::Invalid {
                key: "ALERT_DIRECTION",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => CrossingDirection::default(),
        };

        let enabled = match get("RATE_LIMIT_ENABLED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "RATE_LIMIT_ENABLED",
                value: raw.clone(),
                reason: "expected true/false".to_string(),
            })?,
            None => false,
        };

        let window_minutes = match get("RATE_LIMIT_MINUTES") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m >= 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "RATE_LIMIT_MINUTES",
                    value: raw.clone(),
                    reason: "expected a non-negative whole number".to_string(),
                })?,
            None => DEFAULT_RATE_LIMIT_MINUTES,
        };

        let bot_name = get("BOT_NAME").unwrap_or_else(|| DEFAULT_BOT_NAME.to_string());

        let webhook_url = get("DISCORD_WEBHOOK_URL")
            .or_else(|| get("WEBHOOK_URL"))
            .ok_or(ConfigError::Missing("DISCORD_WEBHOOK_URL"))?;

        let exchange_credentials = match (get("COINBASE_API_KEY"), get("COINBASE_API_SECRET")) {
            (Some(key), Some(secret)) => Some(ExchangeCredentials::new(key, secret)),
            _ => None,
        };

        let gas_api_key = get("BLOCKNATIVE_API_KEY").or_else(|| get("GAS_API_KEY"));

        Ok(Self {
            subject,
            threshold,
            direction,
            rate_limit: RateLimitSettings {
                enabled,
                window_minutes,
            },
            bot_name,
            webhook_url,
            exchange_credentials,
            gas_api_key,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
