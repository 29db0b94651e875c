//! Invocation wiring: resolve config, pick a provider, run the engine.

use crate::config::StoreBackend;
use pricewatch_alerts::{
    AlertConfig, AlertStateStore, ConfigError, Database, MemoryStore, WebhookNotifier,
};
use pricewatch_engine::{AlertEngine, EngineError, Outcome};
use pricewatch_feeds::{select_provider, FeedError, PriceProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Provider selection failed: {0}")]
    Provider(#[from] FeedError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Open the rate-limit store.
///
/// A database that cannot be opened degrades to an in-memory store, which
/// behaves like "no previous alert" for a fresh process.
pub async fn open_store(backend: &StoreBackend) -> Arc<dyn AlertStateStore> {
    match backend {
        StoreBackend::Memory => {
            info!("Using in-memory rate-limit store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite(url) => match Database::connect(url).await {
            Ok(db) => {
                info!("Using SQLite rate-limit store: {}", url);
                Arc::new(db)
            }
            Err(e) => {
                warn!(
                    "Failed to open {}, falling back to in-memory store: {}",
                    url, e
                );
                Arc::new(MemoryStore::new())
            }
        },
    }
}

/// Build the engine for one configuration.
pub fn build_engine(
    config: &AlertConfig,
    client: reqwest::Client,
    store: Arc<dyn AlertStateStore>,
) -> Result<AlertEngine, FeedError> {
    let selection = select_provider(
        &config.subject,
        config.exchange_credentials.as_ref(),
        config.gas_api_key.as_deref(),
    )?;
    let provider = PriceProvider::from_selection(selection, client.clone());
    let notifier = WebhookNotifier::new(client);

    Ok(AlertEngine::new(
        Arc::new(provider),
        store,
        Arc::new(notifier),
    ))
}

/// Run a single invocation with configuration read from the environment.
pub async fn invoke(
    client: &reqwest::Client,
    store: Arc<dyn AlertStateStore>,
) -> Result<Outcome, InvocationError> {
    let config = AlertConfig::from_env()?;
    info!(
        subject = %config.subject,
        threshold = config.threshold,
        direction = %config.direction,
        rate_limited = config.rate_limit.enabled,
        "Running price check"
    );

    let engine = build_engine(&config, client.clone(), store)?;
    Ok(engine.run(&config).await?)
}

/// Run invocations back to back every `period` until Ctrl-C.
///
/// A failed invocation is logged and the schedule continues.
pub async fn run_scheduled(
    client: reqwest::Client,
    store: Arc<dyn AlertStateStore>,
    period: Duration,
) {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_scheduled_until(client, store, period, shutdown).await;
}

/// Run invocations every `period` until `shutdown` resolves.
///
/// `shutdown` is polled across ticks, so a signal that arrives mid-invocation
/// is not lost; the in-flight invocation finishes first.
pub async fn run_scheduled_until<F>(
    client: reqwest::Client,
    store: Arc<dyn AlertStateStore>,
    period: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    info!("Scheduled mode: every {:?}", period);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = invoke(&client, store.clone()).await {
                    error!("Invocation failed: {}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }
}
