//! Error types for price fetching.

use thiserror::Error;

/// Errors that can occur while fetching a price or gas fee.
///
/// Every variant is fatal to the invocation that hit it; nothing here is retried.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("{provider} cannot price subject: {subject}")]
    UnsupportedSubject {
        provider: &'static str,
        subject: String,
    },
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::ParseError(err.to_string())
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
