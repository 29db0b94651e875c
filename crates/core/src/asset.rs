//! Alert subjects and crossing directions.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical spelling of the gas-fee sentinel.
pub const GAS_FEES_SENTINEL: &str = "gas fees";

/// Legacy spelling still accepted from older deployments.
const GAS_FEES_LEGACY: &str = "GASFEES";

/// What an alert watches: a coin price or the Ethereum gas fee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    /// Coin or token identifier as understood by the price provider
    /// (e.g., "bitcoin" for CoinGecko, "BTC" for Coinbase).
    Coin(CompactString),
    /// Ethereum gas fee for a fast transaction, in gwei.
    GasFees,
}

impl Subject {
    /// Parse a subject identifier. The gas sentinel matches case-insensitively.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(GAS_FEES_SENTINEL)
            || trimmed.eq_ignore_ascii_case(GAS_FEES_LEGACY)
        {
            Subject::GasFees
        } else {
            Subject::Coin(CompactString::new(trimmed))
        }
    }

    /// Create a coin subject.
    pub fn coin(symbol: &str) -> Self {
        Subject::Coin(CompactString::new(symbol))
    }

    #[inline]
    pub fn is_gas_fees(&self) -> bool {
        matches!(self, Subject::GasFees)
    }

    /// Identifier as used in messages and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Subject::Coin(symbol) => symbol.as_str(),
            Subject::GasFees => GAS_FEES_SENTINEL,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the threshold fires an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CrossingDirection {
    /// Fire when the value falls to or below the threshold.
    #[default]
    CrossingDown,
    /// Fire when the value rises to or above the threshold.
    CrossingUp,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown crossing direction: {0} (expected 'down' or 'up')")]
pub struct ParseDirectionError(pub String);

impl FromStr for CrossingDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "down" | "below" | "crossing_down" | "crossingdown" => {
                Ok(CrossingDirection::CrossingDown)
            }
            "up" | "above" | "crossing_up" | "crossingup" => Ok(CrossingDirection::CrossingUp),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl fmt::Display for CrossingDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossingDirection::CrossingDown => f.write_str("down"),
            CrossingDirection::CrossingUp => f.write_str("up"),
        }
    }
}
