//! CoinGecko market price provider (no credentials).

use super::PriceSource;
use crate::error::{FeedError, FeedResult};
use crate::rest::{number_field, read_body};
use async_trait::async_trait;
use pricewatch_core::{PriceReading, PriceSourceLabel, Subject};
use tracing::debug;

/// Public CoinGecko simple-price API.
#[derive(Debug, Clone)]
pub struct CoinGeckoProvider {
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    const BASE_URL: &'static str = "https://api.coingecko.com/api/v3";
    const NAME: &'static str = "CoinGecko";

    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Parse a simple-price response: `{"<coin>": {"usd": <price>}}`.
    pub fn parse_simple_price(body: &str, coin: &str) -> FeedResult<f64> {
        let json: serde_json::Value = serde_json::from_str(body)?;
        number_field(&json[coin]["usd"]).ok_or_else(|| {
            FeedError::ParseError(format!("No USD price for '{}' in CoinGecko response", coin))
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    fn label(&self) -> PriceSourceLabel {
        PriceSourceLabel::CoinGecko
    }

    async fn fetch(&self, subject: &Subject) -> FeedResult<PriceReading> {
        let coin = match subject {
            Subject::Coin(coin) => coin.as_str(),
            Subject::GasFees => {
                return Err(FeedError::UnsupportedSubject {
                    provider: Self::NAME,
                    subject: subject.to_string(),
                })
            }
        };

        let url = format!("{}/simple/price", Self::BASE_URL);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", coin), ("vs_currencies", "usd")])
            .send()
            .await?;

        let body = read_body(Self::NAME, response).await?;
        let price = Self::parse_simple_price(&body, coin)?;
        debug!(coin = coin, price = price, "CoinGecko: fetched price");

        Ok(PriceReading::new(price, self.label()))
    }
}
