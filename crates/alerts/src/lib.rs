//! Alert configuration, rate limiting and delivery.
//!
//! This crate provides:
//! - Environment-based alert configuration
//! - SQLite and in-memory storage of last alert times
//! - The fail-soft rate-limit gate
//! - Webhook notifications

pub mod config;
pub mod db;
pub mod notifier;
pub mod rate_limit;

pub use config::{AlertConfig, ConfigError, RateLimitSettings};
pub use db::{AlertStateStore, Database, MemoryStore, StoreError, UnavailableStore};
pub use notifier::{Notifier, NotifyError, RecordingNotifier, WebhookFormat, WebhookNotifier};
pub use rate_limit::{elapsed_minutes_rounded, is_outside_window, RateLimiter};
