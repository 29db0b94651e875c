//! Alert decision engine.
//!
//! One invocation performs at most one price fetch, one rate-limit read, one
//! notification and one rate-limit write, strictly in that order.

use crate::crossing::is_crossed;
use crate::error::EngineResult;
use crate::message::format_alert_message;
use chrono::{DateTime, Utc};
use pricewatch_alerts::{is_outside_window, AlertConfig, AlertStateStore, Notifier, RateLimiter};
use pricewatch_core::PriceReading;
use pricewatch_feeds::PriceSource;
use std::sync::Arc;
use tracing::info;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What an invocation ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Reading is on the quiet side of the threshold.
    NotCrossed { reading: PriceReading },
    /// Threshold crossed but the bot alerted too recently.
    Suppressed {
        reading: PriceReading,
        last_alert: DateTime<Utc>,
    },
    /// Alert sent.
    Notified {
        reading: PriceReading,
        message: String,
    },
}

impl Outcome {
    /// Reading fetched by the invocation.
    pub fn reading(&self) -> &PriceReading {
        match self {
            Outcome::NotCrossed { reading }
            | Outcome::Suppressed { reading, .. }
            | Outcome::Notified { reading, .. } => reading,
        }
    }

    /// Whether an alert was sent.
    pub fn is_notified(&self) -> bool {
        matches!(self, Outcome::Notified { .. })
    }
}

/// Decides whether to alert and dispatches the alert.
pub struct AlertEngine {
    source: Arc<dyn PriceSource>,
    limiter: RateLimiter,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
}

impl AlertEngine {
    /// Create an engine using the system clock.
    pub fn new(
        source: Arc<dyn PriceSource>,
        store: Arc<dyn AlertStateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            limiter: RateLimiter::new(store),
            notifier,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run one invocation against `config`.
    ///
    /// Price fetch and notification errors abort the run. Rate-limit storage
    /// errors do not: a failed read permits the alert, a failed write is dropped.
    pub async fn run(&self, config: &AlertConfig) -> EngineResult<Outcome> {
        let reading = self.source.fetch(&config.subject).await?;

        if !is_crossed(config.direction, reading.value, config.threshold) {
            info!(
                source = %reading.source,
                subject = %config.subject,
                current = reading.value,
                threshold = config.threshold,
                direction = %config.direction,
                "Threshold not crossed"
            );
            return Ok(Outcome::NotCrossed { reading });
        }

        info!(
            source = %reading.source,
            subject = %config.subject,
            current = reading.value,
            threshold = config.threshold,
            direction = %config.direction,
            "Threshold crossed"
        );

        let message =
            format_alert_message(&config.subject, config.direction, config.threshold, &reading);

        if !config.rate_limit.enabled {
            self.notifier.send(&config.webhook_url, &message).await?;
            info!(subject = %config.subject, "Alert sent");
            return Ok(Outcome::Notified { reading, message });
        }

        let last_alert = self.limiter.get_last_alert(&config.bot_name).await;
        let now = (self.clock)();

        if let Some(last) = last_alert {
            if !is_outside_window(Some(last), config.rate_limit.window_minutes, now) {
                info!(
                    bot = %config.bot_name,
                    last_alert = %last,
                    window_minutes = config.rate_limit.window_minutes,
                    "Alert suppressed by rate limit"
                );
                return Ok(Outcome::Suppressed {
                    reading,
                    last_alert: last,
                });
            }
        }

        self.notifier.send(&config.webhook_url, &message).await?;
        info!(bot = %config.bot_name, subject = %config.subject, "Alert sent");

        self.limiter.set_last_alert(&config.bot_name, now).await;

        Ok(Outcome::Notified { reading, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use pricewatch_alerts::{MemoryStore, RecordingNotifier, UnavailableStore};
    use pricewatch_core::{CrossingDirection, PriceSourceLabel, Subject};
    use pricewatch_feeds::MockPriceSource;

    const WEBHOOK: &str = "https://discord.com/api/webhooks/1/abc";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn fixed_clock(at: DateTime<Utc>) -> Clock {
        Arc::new(move || at)
    }

    struct Harness {
        source: Arc<MockPriceSource>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn new(value: f64, label: PriceSourceLabel) -> Self {
            Self {
                source: Arc::new(MockPriceSource::new(value, label)),
                store: Arc::new(MemoryStore::new()),
                notifier: Arc::new(RecordingNotifier::new()),
            }
        }

        fn engine(&self, now: DateTime<Utc>) -> AlertEngine {
            AlertEngine::new(
                self.source.clone(),
                self.store.clone(),
                self.notifier.clone(),
            )
            .with_clock(fixed_clock(now))
        }
    }

    fn btc_config(threshold: f64, direction: CrossingDirection) -> AlertConfig {
        let mut config = AlertConfig::new(Subject::coin("BTC"), threshold, WEBHOOK);
        config.direction = direction;
        config.bot_name = "btc-bot".to_string();
        config
    }

    fn rate_limited(mut config: AlertConfig, window_minutes: i64) -> AlertConfig {
        config.rate_limit.enabled = true;
        config.rate_limit.window_minutes = window_minutes;
        config
    }

    #[test]
    fn test_outcome_accessors() {
        let reading = PriceReading::new(45000.0, PriceSourceLabel::CoinGecko);
        let quiet = Outcome::NotCrossed { reading };
        let sent = Outcome::Notified {
            reading,
            message: "alert".to_string(),
        };
        assert_eq!(quiet.reading(), &reading);
        assert!(!quiet.is_notified());
        assert_eq!(sent.reading(), &reading);
        assert!(sent.is_notified());
    }

    #[tokio::test]
    async fn test_btc_drop_without_rate_limit_notifies_once() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        let config = btc_config(50000.0, CrossingDirection::CrossingDown);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(outcome.is_notified());
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, WEBHOOK);
        assert!(sent[0].1.contains("45000"));
        assert!(sent[0].1.contains("50000"));
        assert!(sent[0].1.contains("dropped below"));
        // Rate limiting off: nothing recorded
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_gas_below_maximum_notifies() {
        let h = Harness::new(80.0, PriceSourceLabel::Blocknative);
        let mut config = AlertConfig::new(Subject::GasFees, 100.0, WEBHOOK);
        config.direction = CrossingDirection::CrossingDown;

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(outcome.is_notified());
        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("below the maximum"));
        assert!(sent[0].1.contains("Blocknative"));
    }

    #[tokio::test]
    async fn test_gas_above_maximum_not_crossed() {
        let h = Harness::new(120.0, PriceSourceLabel::Blocknative);
        let config = AlertConfig::new(Subject::GasFees, 100.0, WEBHOOK);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(matches!(outcome, Outcome::NotCrossed { .. }));
        assert_eq!(h.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_first_rate_limited_alert_writes_state() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(outcome.is_notified());
        assert_eq!(h.notifier.sent_count(), 1);
        assert_eq!(h.store.get("btc-bot").await.unwrap(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn test_recent_alert_suppresses_and_keeps_state() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        let last = fixed_now() - Duration::minutes(30);
        h.store.put("btc-bot", last).await.unwrap();
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Suppressed {
                reading: PriceReading::new(45000.0, PriceSourceLabel::CoinGecko),
                last_alert: last,
            }
        );
        assert_eq!(h.notifier.sent_count(), 0);
        assert_eq!(h.store.get("btc-bot").await.unwrap(), Some(last));
    }

    #[tokio::test]
    async fn test_store_read_failure_fails_open() {
        let source = Arc::new(MockPriceSource::new(45000.0, PriceSourceLabel::CoinGecko));
        let notifier = Arc::new(RecordingNotifier::new());
        let engine = AlertEngine::new(source, Arc::new(UnavailableStore), notifier.clone())
            .with_clock(fixed_clock(fixed_now()));
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = engine.run(&config).await.unwrap();

        // Write failure is swallowed too
        assert!(outcome.is_notified());
        assert_eq!(notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_exact_window_boundary_suppresses() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        h.store
            .put("btc-bot", fixed_now() - Duration::minutes(60))
            .await
            .unwrap();
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(matches!(outcome, Outcome::Suppressed { .. }));
        assert_eq!(h.notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_window_notifies_and_updates_state() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        h.store
            .put("btc-bot", fixed_now() - Duration::minutes(61))
            .await
            .unwrap();
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(outcome.is_notified());
        assert_eq!(h.store.get("btc-bot").await.unwrap(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn test_sequential_runs_alert_once_per_window() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);
        let start = fixed_now();

        for minutes in [0, 10, 30, 59, 60] {
            h.engine(start + Duration::minutes(minutes))
                .run(&config)
                .await
                .unwrap();
        }
        assert_eq!(h.notifier.sent_count(), 1);

        let outcome = h
            .engine(start + Duration::minutes(61))
            .run(&config)
            .await
            .unwrap();
        assert!(outcome.is_notified());
        assert_eq!(h.notifier.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_bot() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        let btc = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);
        let mut other = btc.clone();
        other.bot_name = "other-bot".to_string();

        let engine = h.engine(fixed_now());
        assert!(engine.run(&btc).await.unwrap().is_notified());
        assert!(engine.run(&other).await.unwrap().is_notified());
        assert!(!engine.run(&btc).await.unwrap().is_notified());
        assert_eq!(h.notifier.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_disabled_rate_limit_ignores_prior_state() {
        let h = Harness::new(45000.0, PriceSourceLabel::CoinGecko);
        h.store
            .put("btc-bot", fixed_now() - Duration::minutes(1))
            .await
            .unwrap();
        let config = btc_config(50000.0, CrossingDirection::CrossingDown);
        let engine = h.engine(fixed_now());

        for _ in 0..3 {
            assert!(engine.run(&config).await.unwrap().is_notified());
        }
        assert_eq!(h.notifier.sent_count(), 3);
    }

    #[tokio::test]
    async fn test_crossing_up_on_equal_value() {
        let h = Harness::new(50000.0, PriceSourceLabel::Coinbase);
        let config = btc_config(50000.0, CrossingDirection::CrossingUp);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert!(outcome.is_notified());
        assert!(h.notifier.sent()[0].1.contains("risen above"));
    }

    #[tokio::test]
    async fn test_not_crossed_does_nothing() {
        let h = Harness::new(55000.0, PriceSourceLabel::CoinGecko);
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let outcome = h.engine(fixed_now()).run(&config).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::NotCrossed {
                reading: PriceReading::new(55000.0, PriceSourceLabel::CoinGecko)
            }
        );
        assert_eq!(h.notifier.sent_count(), 0);
        assert!(h.store.is_empty());
        assert_eq!(h.source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_price_fetch_error_aborts() {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(MemoryStore::new());
        let engine = AlertEngine::new(
            Arc::new(MockPriceSource::failing()),
            store.clone(),
            notifier.clone(),
        );
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let result = engine.run(&config).await;

        assert!(matches!(result, Err(EngineError::PriceFetch(_))));
        assert_eq!(notifier.sent_count(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_notification_error_propagates_without_state_write() {
        let store = Arc::new(MemoryStore::new());
        let engine = AlertEngine::new(
            Arc::new(MockPriceSource::new(45000.0, PriceSourceLabel::CoinGecko)),
            store.clone(),
            Arc::new(RecordingNotifier::failing()),
        )
        .with_clock(fixed_clock(fixed_now()));
        let config = rate_limited(btc_config(50000.0, CrossingDirection::CrossingDown), 60);

        let result = engine.run(&config).await;

        assert!(matches!(result, Err(EngineError::Notify(_))));
        assert!(store.is_empty());
    }
}
