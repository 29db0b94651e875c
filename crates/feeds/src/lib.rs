//! Price and gas-fee collection from upstream REST APIs.
//!
//! ## Architecture
//!
//! - `adapter/` - Provider-specific requests and response parsing
//! - `signing` - HMAC request signing for the authenticated exchange
//! - `rest` - Shared HTTP client and response handling

pub mod adapter;
pub mod error;
pub mod rest;
pub mod signing;

pub use adapter::{
    select_provider, BlocknativeProvider, CoinGeckoProvider, CoinbaseProvider, MockPriceSource,
    PriceProvider, PriceSource, ProviderSelection, SignedHeaders,
};
pub use error::*;
pub use rest::{build_client, DEFAULT_TIMEOUT};
pub use signing::{latin1_bytes, sign_request};
