//! Trade Sync Binary
//!
//! Backfills missing public trades for every configured market into the
//! local trade store (`store.path`, default `trades.db`). Trades already in
//! the store are not fetched again, so a later run only fills the gaps that
//! remain.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin trade-sync -- config.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: `trade_sync=info`)
//! - Any variable referenced as `${VAR}` in the config file; a `.env` file
//!   in the working directory or an ancestor is loaded first.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use trade_sync::application::ports::ThrottlePort;
use trade_sync::application::services::ThrottledFetcher;
use trade_sync::application::use_cases::SyncTradesUseCase;
use trade_sync::config::{Config, load_config};
use trade_sync::infrastructure::{BitfinexClient, QuotaThrottle, TursoTradeStore};
use trade_sync::observability::{MetricsConfig, TracingConfig, init_metrics, init_tracing};

/// Concrete type alias for the sync use case.
type ConcreteSyncTradesUseCase =
    SyncTradesUseCase<ThrottledFetcher<BitfinexClient>, TursoTradeStore>;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv_from_ancestors();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref()).context("failed to load configuration")?;

    init_tracing(&TracingConfig {
        json: config.logging.json,
        ansi: !config.logging.json,
    });

    if let Some(addr) = config.observability.metrics_addr {
        init_metrics(&MetricsConfig::with_addr(addr)).context("failed to start metrics exporter")?;
    }

    if config.markets.is_empty() {
        tracing::warn!("No markets configured, nothing to sync");
        return Ok(());
    }

    let shutdown_token = CancellationToken::new();
    spawn_ctrl_c_handler(shutdown_token.clone());

    let use_case = Arc::new(build_use_case(&config, shutdown_token).await?);
    let (start, end) = config.window.resolve(chrono::Utc::now().timestamp_millis());

    tracing::info!(
        markets = config.markets.len(),
        start,
        end,
        store = %config.store.path,
        requests = config.throttle.requests,
        interval_secs = config.throttle.interval_secs,
        "Starting trade sync"
    );

    // Markets run concurrently; the shared throttle keeps them within one quota.
    let mut tasks = JoinSet::new();
    for market in &config.markets {
        let selector = market.selector();
        let use_case = Arc::clone(&use_case);
        tasks.spawn(async move {
            let result = use_case.sync(&selector, start, end).await;
            (selector, result)
        });
    }

    let mut failures = 0_usize;
    while let Some(joined) = tasks.join_next().await {
        let (selector, result) = joined.context("sync task panicked")?;
        match result {
            Ok(report) => tracing::info!(
                market = %selector,
                gaps = report.ranges.len(),
                pages = report.total_pages(),
                trades = report.total_trades(),
                completed = report.fully_completed(),
                "Market synced"
            ),
            Err(e) => {
                failures += 1;
                tracing::error!(market = %selector, code = %e.code(), error = %e, "Market sync failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} markets failed to sync", config.markets.len());
    }

    tracing::info!("Trade sync finished");
    Ok(())
}

/// Wire the throttle, Bitfinex client and store into the sync use case.
async fn build_use_case(
    config: &Config,
    shutdown_token: CancellationToken,
) -> Result<ConcreteSyncTradesUseCase> {
    let throttle: Arc<dyn ThrottlePort> = Arc::new(
        QuotaThrottle::new(config.throttle.requests, config.throttle.interval())
            .context("invalid throttle configuration")?,
    );
    let client = BitfinexClient::from_config(&config.source).context("failed to build HTTP client")?;
    let fetcher =
        ThrottledFetcher::new(Arc::new(client), throttle).with_retry(config.source.retry.clone());
    if config.store.is_ephemeral() {
        tracing::warn!("Trade store is in memory, synced trades are dropped on exit");
    }
    let store = Arc::new(
        TursoTradeStore::open(&config.store.path)
            .await
            .with_context(|| format!("failed to open trade store '{}'", config.store.path))?,
    );
    let policy = config.gap_policy()?;

    let use_case = SyncTradesUseCase::new(Arc::new(fetcher), store, policy, config.sync.page_limit)
        .context("invalid sync configuration")?
        .with_cancellation(shutdown_token);
    Ok(use_case)
}

/// Cancel `token` on Ctrl-C. Pages already in flight finish first.
fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, stopping after current page");
            token.cancel();
        }
    });
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
