//! Prometheus metrics for trade sync.
//!
//! # Example
//!
//! ```ignore
//! use trade_sync::observability::{init_metrics, MetricsConfig};
//!
//! let config = MetricsConfig::with_addr("0.0.0.0:9090".parse()?);
//! init_metrics(&config)?;
//! ```

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Create a new metrics configuration with a custom address.
    #[must_use]
    pub const fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Record gaps found for a market.
pub fn record_gaps_detected(symbol: &str, count: usize) {
    counter!(
        "trade_sync_gaps_detected_total",
        "symbol" => symbol.to_string()
    )
    .increment(count as u64);
}

/// Record one fetched page.
pub fn record_page_fetched(symbol: &str) {
    counter!(
        "trade_sync_pages_fetched_total",
        "symbol" => symbol.to_string()
    )
    .increment(1);
}

/// Record trades newly written to the store. Duplicates the store skipped
/// are not counted.
pub fn record_trades_stored(symbol: &str, count: usize) {
    counter!(
        "trade_sync_trades_stored_total",
        "symbol" => symbol.to_string()
    )
    .increment(count as u64);
}

/// Record a gap abandoned on an empty page.
pub fn record_range_exhausted(symbol: &str) {
    counter!(
        "trade_sync_ranges_exhausted_total",
        "symbol" => symbol.to_string()
    )
    .increment(1);
}

/// Record a retried fetch.
pub fn record_fetch_retry(symbol: &str) {
    counter!(
        "trade_sync_fetch_retries_total",
        "symbol" => symbol.to_string()
    )
    .increment(1);
}
