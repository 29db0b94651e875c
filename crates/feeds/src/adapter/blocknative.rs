//! Blocknative gas-fee provider.

use super::PriceSource;
use crate::error::{FeedError, FeedResult};
use crate::rest::{number_field, read_body};
use async_trait::async_trait;
use pricewatch_core::{PriceReading, PriceSourceLabel, Subject};
use tracing::debug;

/// Blocknative block-prices API. Requires an API key.
#[derive(Debug, Clone)]
pub struct BlocknativeProvider {
    client: reqwest::Client,
    api_key: String,
}

impl BlocknativeProvider {
    const URL: &'static str = "https://api.blocknative.com/gasprices/blockprices";
    const NAME: &'static str = "Blocknative";

    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Parse a block-prices response into a fast-transaction fee in gwei.
    ///
    /// The list is walked in order and the fee of the last entry wins. Each
    /// entry contributes the first (highest-confidence) estimated price.
    pub fn parse_block_prices(body: &str) -> FeedResult<f64> {
        let json: serde_json::Value = serde_json::from_str(body)?;
        let entries = json["blockPrices"]
            .as_array()
            .ok_or_else(|| FeedError::ParseError("No blockPrices array".to_string()))?;

        let mut fee = None;
        for entry in entries {
            let price = number_field(&entry["estimatedPrices"][0]["price"]).ok_or_else(|| {
                FeedError::ParseError("Block entry without estimatedPrices[0].price".to_string())
            })?;
            fee = Some(price);
        }

        fee.ok_or_else(|| FeedError::ParseError("Empty blockPrices array".to_string()))
    }
}

#[async_trait]
impl PriceSource for BlocknativeProvider {
    fn label(&self) -> PriceSourceLabel {
        PriceSourceLabel::Blocknative
    }

    async fn fetch(&self, subject: &Subject) -> FeedResult<PriceReading> {
        if !subject.is_gas_fees() {
            return Err(FeedError::UnsupportedSubject {
                provider: Self::NAME,
                subject: subject.to_string(),
            });
        }

        if self.api_key.is_empty() {
            return Err(FeedError::MissingCredentials(
                "Blocknative API key is required".to_string(),
            ));
        }

        let response = self
            .client
            .get(Self::URL)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let body = read_body(Self::NAME, response).await?;
        let fee = Self::parse_block_prices(&body)?;
        debug!(fee_gwei = fee, "Blocknative: fetched gas fee");

        Ok(PriceReading::new(fee, self.label()))
    }
}
