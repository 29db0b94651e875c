//! Price readings and persisted alert state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream provider that produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceSourceLabel {
    /// Public market-price API, no credentials.
    CoinGecko,
    /// Authenticated exchange API (signed requests).
    Coinbase,
    /// Gas-fee estimation API.
    Blocknative,
}

impl PriceSourceLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceSourceLabel::CoinGecko => "CoinGecko",
            PriceSourceLabel::Coinbase => "Coinbase",
            PriceSourceLabel::Blocknative => "Blocknative",
        }
    }
}

impl fmt::Display for PriceSourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single value fetched from a price or gas-fee source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    /// Price in USD, or gas fee in gwei.
    pub value: f64,
    /// Provider that produced the value.
    pub source: PriceSourceLabel,
}

impl PriceReading {
    pub fn new(value: f64, source: PriceSourceLabel) -> Self {
        Self { value, source }
    }
}

/// Last alert time for one bot. One record per bot name, overwritten on each alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub bot_name: String,
    /// Always UTC.
    pub last_alert_time: DateTime<Utc>,
}

impl AlertState {
    pub fn new(bot_name: impl Into<String>, last_alert_time: DateTime<Utc>) -> Self {
        Self {
            bot_name: bot_name.into(),
            last_alert_time,
        }
    }
}
