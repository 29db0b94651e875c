//! Shared REST plumbing for the price providers.

use crate::error::{FeedError, FeedResult};
use std::time::Duration;
use tracing::debug;

/// Default timeout applied to every provider request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by all providers.
pub fn build_client(timeout: Duration) -> FeedResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::Request(format!("Failed to build client: {}", e)))
}

/// Read a response body, turning non-success statuses into errors.
pub(crate) async fn read_body(
    provider: &'static str,
    response: reqwest::Response,
) -> FeedResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!("{}: HTTP {}", provider, status);
        return Err(FeedError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Read a JSON number that may also be encoded as a string.
pub(crate) fn number_field(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}
