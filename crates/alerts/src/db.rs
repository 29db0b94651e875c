//! Persistence for per-bot alert state.
//!
//! One row per bot name holding the UTC time of its last alert. Writes are
//! unconditional upserts: two overlapping invocations for the same bot can
//! both pass the window check, and the later write wins.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use pricewatch_core::AlertState;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Invalid stored timestamp for {bot_name}: {value}")]
    InvalidTimestamp { bot_name: String, value: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value storage of last alert times, keyed by bot name.
#[async_trait]
pub trait AlertStateStore: Send + Sync {
    /// Last alert time for a bot, `None` if it never alerted.
    async fn get(&self, bot_name: &str) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Overwrite the last alert time for a bot.
    async fn put(&self, bot_name: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Format a timestamp for storage.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the naive `YYYY-MM-DD HH:MM:SS.ffffff` form (read as UTC)
/// written by older deployments.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// SQLite-backed alert state store.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        // Every in-memory connection is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alert_state (
                bot_name TEXT PRIMARY KEY NOT NULL,
                last_alert_time TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All stored records, ordered by bot name.
    pub async fn all_states(&self) -> Result<Vec<AlertState>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT bot_name, last_alert_time FROM alert_state ORDER BY bot_name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(bot_name, value)| match parse_timestamp(&value) {
                Some(last_alert_time) => Ok(AlertState {
                    bot_name,
                    last_alert_time,
                }),
                None => Err(StoreError::InvalidTimestamp { bot_name, value }),
            })
            .collect()
    }
}

#[async_trait]
impl AlertStateStore for Database {
    async fn get(&self, bot_name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT last_alert_time FROM alert_state WHERE bot_name = ?",
        )
        .bind(bot_name)
        .fetch_optional(&self.pool)
        .await?;

        match value {
            None => Ok(None),
            Some(value) => parse_timestamp(&value).map(Some).ok_or_else(|| {
                StoreError::InvalidTimestamp {
                    bot_name: bot_name.to_string(),
                    value,
                }
            }),
        }
    }

    async fn put(&self, bot_name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO alert_state (bot_name, last_alert_time)
            VALUES (?, ?)
            ON CONFLICT(bot_name)
            DO UPDATE SET last_alert_time = excluded.last_alert_time
            "#,
        )
        .bind(bot_name)
        .bind(format_timestamp(at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-process alert state store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    states: DashMap<String, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bots with a stored alert time.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[async_trait]
impl AlertStateStore for MemoryStore {
    async fn get(&self, bot_name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.states.get(bot_name).map(|entry| *entry.value()))
    }

    async fn put(&self, bot_name: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.states.insert(bot_name.to_string(), at);
        Ok(())
    }
}

/// Store whose every operation fails, for exercising fail-soft paths.
#[derive(Debug, Default)]
pub struct UnavailableStore;

#[async_trait]
impl AlertStateStore for UnavailableStore {
    async fn get(&self, _bot_name: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Err(StoreError::Unavailable("simulated read failure".to_string()))
    }

    async fn put(&self, _bot_name: &str, _at: DateTime<Utc>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("simulated write failure".to_string()))
    }
}
