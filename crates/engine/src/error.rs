//! Error types for alert invocations.

use pricewatch_alerts::NotifyError;
use pricewatch_feeds::FeedError;
use thiserror::Error;

/// Errors that abort an invocation.
///
/// Rate-limit storage errors never appear here; they are absorbed by the limiter.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Price fetch failed: {0}")]
    PriceFetch(#[from] FeedError),

    #[error("Notification failed: {0}")]
    Notify(#[from] NotifyError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
