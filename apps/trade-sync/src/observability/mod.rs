//! Observability module for metrics and logging.
//!
//! Structured logs go through `tracing`; counters go through the `metrics`
//! facade and are exported by Prometheus when the binary installs it.

mod logging;
mod metrics;

pub use self::logging::{TracingConfig, init_tracing};
pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_fetch_retry, record_gaps_detected,
    record_page_fetched, record_range_exhausted, record_trades_stored,
};
