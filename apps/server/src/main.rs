//! Crypto Alerts - scheduled price and gas fee alerts
//!
//! Each invocation fetches the current price of the configured coin (or the
//! current gas fee), compares it to a threshold and posts a webhook message
//! when the threshold is crossed, subject to an optional per-bot rate limit.

mod config;
mod runner;

use clap::Parser;
use config::{RunSettings, StoreBackend};
use pricewatch_feeds::build_client;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Crypto Alerts CLI
#[derive(Parser, Debug)]
#[command(name = "crypto-alerts")]
#[command(about = "Threshold alerts for crypto prices and gas fees", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// SQLite database holding last-alert times
    #[arg(long, default_value = "sqlite://crypto-alerts.db")]
    database_url: String,

    /// Keep last-alert times in memory instead of SQLite
    #[arg(long, default_value_t = false)]
    memory_store: bool,

    /// Run every N minutes until interrupted instead of once
    #[arg(short, long)]
    every_minutes: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

impl From<&Args> for RunSettings {
    fn from(args: &Args) -> Self {
        let store = if args.memory_store {
            StoreBackend::Memory
        } else {
            StoreBackend::Sqlite(args.database_url.clone())
        };

        Self {
            store,
            every: args
                .every_minutes
                .filter(|m| *m > 0)
                .map(|m| Duration::from_secs(m * 60)),
            timeout: Duration::from_secs(args.timeout_secs),
            log_level: args.log_level.clone(),
        }
    }
}

/// Normalize a `--log-level` value; unknown levels fall back to info.
fn log_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `--log-level` when set.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(log_level(level)).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let settings = RunSettings::from(&args);
    init_logging(&settings.log_level);

    info!("Starting crypto-alerts");

    let client = match build_client(settings.timeout) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store = runner::open_store(&settings.store).await;

    match settings.every {
        Some(period) => {
            runner::run_scheduled(client, store, period).await;
            ExitCode::SUCCESS
        }
        None => match runner::invoke(&client, store).await {
            Ok(outcome) => {
                info!(notified = outcome.is_notified(), "Invocation complete");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Invocation failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}
