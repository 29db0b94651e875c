//! Alert delivery to messaging webhooks.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Delivers a text message to an endpoint.
///
/// Delivery is fire-and-forget: callers do not inspect or retry the outcome
/// beyond the transport error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, endpoint: &str, text: &str) -> Result<(), NotifyError>;
}

/// Payload shape expected by the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFormat {
    /// `{"content": ...}`
    Discord,
    /// `{"text": ...}`
    Slack,
}

impl WebhookFormat {
    /// Guess the format from the webhook URL. Anything not Slack is treated as Discord.
    pub fn detect(url: &str) -> Self {
        if url.contains("hooks.slack.com") {
            WebhookFormat::Slack
        } else {
            WebhookFormat::Discord
        }
    }

    pub fn payload(self, text: &str) -> serde_json::Value {
        match self {
            WebhookFormat::Discord => json!({ "content": text }),
            WebhookFormat::Slack => json!({ "text": text }),
        }
    }
}

/// Posts messages to Discord or Slack incoming webhooks.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, endpoint: &str, text: &str) -> Result<(), NotifyError> {
        let format = WebhookFormat::detect(endpoint);
        let response = self
            .http_client
            .post(endpoint)
            .json(&format.payload(text))
            .send()
            .await?;

        if response.status().is_success() {
            debug!(format = ?format, "Webhook message delivered");
        } else {
            warn!(
                "Webhook returned non-success status: {}",
                response.status()
            );
        }

        Ok(())
    }
}

/// Notifier that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    /// Fail every send.
    pub should_fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    /// Sent `(endpoint, text)` pairs, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, endpoint: &str, text: &str) -> Result<(), NotifyError> {
        if self.should_fail {
            return Err(NotifyError::Unavailable("Mock failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((endpoint.to_string(), text.to_string()));
        }
        Ok(())
    }
}
