//! Price source trait and provider implementations.
//!
//! Each upstream API has its own request and response format.
//! Providers normalize these into a [`PriceReading`].

mod blocknative;
mod coinbase;
mod coingecko;

pub use blocknative::BlocknativeProvider;
pub use coinbase::{CoinbaseProvider, SignedHeaders};
pub use coingecko::CoinGeckoProvider;

use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use pricewatch_core::{ExchangeCredentials, PriceReading, PriceSourceLabel, Subject};
use std::sync::atomic::{AtomicU32, Ordering};

/// Anything that can produce a current price for a subject.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Label of the upstream source.
    fn label(&self) -> PriceSourceLabel;

    /// Fetch the current value. Failures are not retried.
    async fn fetch(&self, subject: &Subject) -> FeedResult<PriceReading>;
}

/// Which provider to use, decided from configuration alone.
#[derive(Debug, Clone)]
pub enum ProviderSelection {
    /// Public market-price API.
    Generic,
    /// Signed exchange API.
    Authenticated(ExchangeCredentials),
    /// Gas-fee API.
    GasFee { api_key: String },
}

/// Pick a provider.
///
/// Gas subjects always use the gas provider and need its API key. Coin
/// subjects use the authenticated exchange when both key and secret are
/// present, otherwise the generic provider.
pub fn select_provider(
    subject: &Subject,
    exchange_credentials: Option<&ExchangeCredentials>,
    gas_api_key: Option<&str>,
) -> FeedResult<ProviderSelection> {
    if subject.is_gas_fees() {
        return match gas_api_key.filter(|key| !key.is_empty()) {
            Some(key) => Ok(ProviderSelection::GasFee {
                api_key: key.to_string(),
            }),
            None => Err(FeedError::MissingCredentials(
                "gas fee alerts need a gas provider API key".to_string(),
            )),
        };
    }

    match exchange_credentials.filter(|creds| creds.is_configured()) {
        Some(creds) => Ok(ProviderSelection::Authenticated(creds.clone())),
        None => Ok(ProviderSelection::Generic),
    }
}

/// The concrete provider variants.
#[derive(Debug, Clone)]
pub enum PriceProvider {
    Generic(CoinGeckoProvider),
    Authenticated(CoinbaseProvider),
    GasFee(BlocknativeProvider),
}

impl PriceProvider {
    /// Build the provider for a selection, sharing one HTTP client.
    pub fn from_selection(selection: ProviderSelection, client: reqwest::Client) -> Self {
        match selection {
            ProviderSelection::Generic => PriceProvider::Generic(CoinGeckoProvider::new(client)),
            ProviderSelection::Authenticated(creds) => {
                PriceProvider::Authenticated(CoinbaseProvider::new(client, creds))
            }
            ProviderSelection::GasFee { api_key } => {
                PriceProvider::GasFee(BlocknativeProvider::new(client, api_key))
            }
        }
    }
}

#[async_trait]
impl PriceSource for PriceProvider {
    fn label(&self) -> PriceSourceLabel {
        match self {
            PriceProvider::Generic(p) => p.label(),
            PriceProvider::Authenticated(p) => p.label(),
            PriceProvider::GasFee(p) => p.label(),
        }
    }

    async fn fetch(&self, subject: &Subject) -> FeedResult<PriceReading> {
        match self {
            PriceProvider::Generic(p) => p.fetch(subject).await,
            PriceProvider::Authenticated(p) => p.fetch(subject).await,
            PriceProvider::GasFee(p) => p.fetch(subject).await,
        }
    }
}

/// Mock price source for testing.
pub struct MockPriceSource {
    /// Value to return; `None` simulates a fetch failure.
    pub value: Option<f64>,
    /// Label attached to readings.
    pub source: PriceSourceLabel,
    fetch_count: AtomicU32,
}

impl MockPriceSource {
    /// Source that always returns `value`.
    pub fn new(value: f64, source: PriceSourceLabel) -> Self {
        Self {
            value: Some(value),
            source,
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Source whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            value: None,
            source: PriceSourceLabel::CoinGecko,
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Number of fetches performed so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    fn label(&self) -> PriceSourceLabel {
        self.source
    }

    async fn fetch(&self, _subject: &Subject) -> FeedResult<PriceReading> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        match self.value {
            Some(value) => Ok(PriceReading::new(value, self.source)),
            None => Err(FeedError::Request("Mock failure".to_string())),
        }
    }
}
