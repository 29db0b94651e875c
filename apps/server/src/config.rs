//! Process-level run settings.
//!
//! Alert settings come from the environment on every invocation
//! (see `AlertConfig::from_env`); these settings only shape the process.

use std::time::Duration;

/// Where last-alert times are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite database URL.
    Sqlite(String),
    /// Process memory; state is lost on exit.
    Memory,
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Rate-limit store.
    pub store: StoreBackend,
    /// Run repeatedly with this period instead of once.
    pub every: Option<Duration>,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Logging level.
    pub log_level: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            store: StoreBackend::Sqlite("sqlite://crypto-alerts.db".to_string()),
            every: None,
            timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
        }
    }
}
