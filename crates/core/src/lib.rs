//! Core data types for the price alert bot.

pub mod asset;
pub mod credentials;
pub mod price;

pub use asset::*;
pub use credentials::*;
pub use price::*;
