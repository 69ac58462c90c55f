//! Log subscriber setup.
//!
//! `RUST_LOG` takes precedence; otherwise `trade_sync=info` is applied.

use tracing_subscriber::EnvFilter;

/// Subscriber options.
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
    /// Include ANSI colors in human-readable output.
    pub ansi: bool,
}

/// Default directive when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVE: &str = "trade_sync=info";

/// Install the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_ansi(config.ansi).try_init()
    };

    result.is_ok()
}
