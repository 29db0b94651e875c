//! Price alert decision engine.
//!
//! This crate decides whether a fetched price crosses the configured
//! threshold, applies the per-bot rate limit and dispatches the alert.

pub mod crossing;
pub mod engine;
pub mod error;
pub mod message;

pub use crossing::*;
pub use engine::*;
pub use error::*;
pub use message::*;
