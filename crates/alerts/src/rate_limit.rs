//! Rate-limit gate over an [`AlertStateStore`].
//!
//! Storage failures never fail an invocation: a failed read is treated as
//! "no previous alert" (fail-open) and a failed write is logged and dropped.

use crate::db::AlertStateStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Minutes between `last_alert` and `now`, rounded to the nearest whole
/// minute with ties going to the even neighbour.
pub fn elapsed_minutes_rounded(last_alert: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let delta = now - last_alert;
    let seconds = delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_seconds() as f64);
    (seconds / 60.0).round_ties_even()
}

/// Whether enough time has passed since the last alert to send another.
///
/// True when there is no previous alert. Otherwise the rounded elapsed
/// minutes must be strictly greater than `window_minutes`; landing exactly on
/// the window still suppresses.
pub fn is_outside_window(
    last_alert: Option<DateTime<Utc>>,
    window_minutes: i64,
    now: DateTime<Utc>,
) -> bool {
    match last_alert {
        None => true,
        Some(last) => elapsed_minutes_rounded(last, now) > window_minutes as f64,
    }
}

/// Fail-soft access to per-bot alert state.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn AlertStateStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn AlertStateStore>) -> Self {
        Self { store }
    }

    /// Last alert time for a bot. Storage errors are logged and read as `None`.
    pub async fn get_last_alert(&self, bot_name: &str) -> Option<DateTime<Utc>> {
        match self.store.get(bot_name).await {
            Ok(last) => {
                debug!(bot = bot_name, last_alert = ?last, "Loaded last alert time");
                last
            }
            Err(e) => {
                warn!(bot = bot_name, error = %e, "Can't get last alert time, treating as none");
                None
            }
        }
    }

    /// Record `now` as the bot's last alert time. Storage errors are logged only.
    pub async fn set_last_alert(&self, bot_name: &str, now: DateTime<Utc>) {
        match self.store.put(bot_name, now).await {
            Ok(()) => debug!(bot = bot_name, at = %now, "Stored last alert time"),
            Err(e) => warn!(bot = bot_name, error = %e, "Can't store last alert time"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UnavailableStore};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_previous_alert_is_outside() {
        assert!(is_outside_window(None, 60, now()));
        assert!(is_outside_window(None, 0, now()));
        assert!(is_outside_window(None, i64::MAX, now()));
    }

    #[test]
    fn test_exact_boundary_is_suppressed() {
        let last = now() - Duration::minutes(60);
        assert!(!is_outside_window(Some(last), 60, now()));
    }

    #[test]
    fn test_past_window_is_outside() {
        let last = now() - Duration::minutes(61);
        assert!(is_outside_window(Some(last), 60, now()));
    }

    #[test]
    fn test_inside_window_is_suppressed() {
        let last = now() - Duration::minutes(30);
        assert!(!is_outside_window(Some(last), 60, now()));
    }

    #[test]
    fn test_rounding_near_boundary() {
        // 60m29s rounds to 60: suppressed
        let last = now() - Duration::seconds(60 * 60 + 29);
        assert!(!is_outside_window(Some(last), 60, now()));

        // 60m31s rounds to 61: allowed
        let last = now() - Duration::seconds(60 * 60 + 31);
        assert!(is_outside_window(Some(last), 60, now()));

        // 59m31s rounds up to 60: allowed for a 59 minute window, not for 60
        let last = now() - Duration::seconds(59 * 60 + 31);
        assert!(is_outside_window(Some(last), 59, now()));
        assert!(!is_outside_window(Some(last), 60, now()));
    }

    #[test]
    fn test_half_minute_ties_round_to_even() {
        // 60.5 -> 60 (even): suppressed
        let last = now() - Duration::seconds(60 * 60 + 30);
        assert_eq!(elapsed_minutes_rounded(last, now()), 60.0);
        assert!(!is_outside_window(Some(last), 60, now()));

        // 61.5 -> 62 (even): allowed for a 61 minute window
        let last = now() - Duration::seconds(61 * 60 + 30);
        assert_eq!(elapsed_minutes_rounded(last, now()), 62.0);
        assert!(is_outside_window(Some(last), 61, now()));
    }

    #[test]
    fn test_zero_window() {
        // Under half a minute rounds to zero, which is not > 0
        let last = now() - Duration::seconds(20);
        assert!(!is_outside_window(Some(last), 0, now()));

        let last = now() - Duration::seconds(40);
        assert!(is_outside_window(Some(last), 0, now()));
    }

    #[test]
    fn test_last_alert_in_future_is_suppressed() {
        let last = now() + Duration::minutes(5);
        assert!(!is_outside_window(Some(last), 0, now()));
    }

    #[tokio::test]
    async fn test_limiter_round_trip() {
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()));
        assert_eq!(limiter.get_last_alert("btc-bot").await, None);

        limiter.set_last_alert("btc-bot", now()).await;
        assert_eq!(limiter.get_last_alert("btc-bot").await, Some(now()));
    }

    #[tokio::test]
    async fn test_limiter_fails_open_on_read_error() {
        let limiter = RateLimiter::new(Arc::new(UnavailableStore));
        let last = limiter.get_last_alert("btc-bot").await;
        assert_eq!(last, None);
        assert!(is_outside_window(last, 60, now()));
    }

    #[tokio::test]
    async fn test_limiter_swallows_write_error() {
        let limiter = RateLimiter::new(Arc::new(UnavailableStore));
        // Must not panic or propagate
        limiter.set_last_alert("btc-bot", now()).await;
    }
}
