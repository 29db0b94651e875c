//! Coinbase authenticated price provider.
//!
//! Every request carries `CB-ACCESS-KEY`, `CB-ACCESS-TIMESTAMP` and a
//! `CB-ACCESS-SIGN` HMAC computed by [`sign_request`].

use super::PriceSource;
use crate::error::{FeedError, FeedResult};
use crate::rest::{number_field, read_body};
use crate::signing::sign_request;
use async_trait::async_trait;
use pricewatch_core::{ExchangeCredentials, PriceReading, PriceSourceLabel, Subject};
use tracing::debug;

/// Headers attached to a signed Coinbase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub timestamp: String,
    pub signature: String,
}

/// Coinbase v2 sell-price API, signed with the account's API key and secret.
#[derive(Debug, Clone)]
pub struct CoinbaseProvider {
    client: reqwest::Client,
    credentials: ExchangeCredentials,
}

impl CoinbaseProvider {
    const BASE_URL: &'static str = "https://api.coinbase.com";
    const NAME: &'static str = "Coinbase";

    pub fn new(client: reqwest::Client, credentials: ExchangeCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Request path for a coin's USD sell price.
    pub fn price_path(coin: &str) -> String {
        format!("/v2/prices/{}-USD/sell", coin)
    }

    /// Sign a request at the given unix timestamp (seconds).
    pub fn signed_headers(
        credentials: &ExchangeCredentials,
        timestamp: i64,
        method: &str,
        path: &str,
        body: &str,
    ) -> FeedResult<SignedHeaders> {
        let timestamp = timestamp.to_string();
        let signature = sign_request(&credentials.api_secret, &timestamp, method, path, body)?;
        Ok(SignedHeaders {
            api_key: credentials.api_key.clone(),
            timestamp,
            signature,
        })
    }

    /// Parse a price response: `{"data": {"amount": "<price>", ...}}`.
    pub fn parse_price(body: &str) -> FeedResult<f64> {
        let json: serde_json::Value = serde_json::from_str(body)?;
        number_field(&json["data"]["amount"])
            .ok_or_else(|| FeedError::ParseError("No data.amount in Coinbase response".to_string()))
    }
}

#[async_trait]
impl PriceSource for CoinbaseProvider {
    fn label(&self) -> PriceSourceLabel {
        PriceSourceLabel::Coinbase
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

        if !self.credentials.is_configured() {
            return Err(FeedError::MissingCredentials(
                "Coinbase API key and secret are required".to_string(),
            ));
        }

        let path = Self::price_path(coin);
        let headers = Self::signed_headers(
            &self.credentials,
            chrono::Utc::now().timestamp(),
            "GET",
            &path,
            "",
        )?;

        let response = self
            .client
            .get(format!("{}{}", Self::BASE_URL, path))
            .header("CB-ACCESS-SIGN", &headers.signature)
            .header("CB-ACCESS-TIMESTAMP", &headers.timestamp)
            .header("CB-ACCESS-KEY", &headers.api_key)
            .send()
            .await?;

        let body = read_body(Self::NAME, response).await?;
        let price = Self::parse_price(&body)?;
        debug!(coin = coin, price = price, "Coinbase: fetched price");

        Ok(PriceReading::new(price, self.label()))
    }
}
