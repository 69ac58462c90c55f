//! Configuration module for trade sync.
//!
//! Loads YAML with `${VAR}` / `${VAR:-default}` environment interpolation,
//! fills every omitted section with defaults and validates the result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use trade_sync::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("quota: {} per {}s", config.throttle.requests, config.throttle.interval_secs);
//! ```

mod observability;
mod source;
mod store;
mod sync;
mod throttle;
mod window;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::{LoggingConfig, ObservabilityConfig};
pub use source::SourceConfig;
pub use store::StoreConfig;
pub use sync::SyncConfig;
pub use throttle::ThrottleConfig;
pub use window::{MarketConfig, WindowConfig};

use crate::domain::GapPolicy;
use crate::infrastructure::bitfinex::BITFINEX_EXCHANGE;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gap detection and paging.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Shared request quota.
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Remote source.
    #[serde(default)]
    pub source: SourceConfig,
    /// Local trade store.
    #[serde(default)]
    pub store: StoreConfig,
    /// Markets to sync.
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
    /// Window to sync.
    #[serde(default)]
    pub window: WindowConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Metrics exporter.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Gap policy built from the `sync` section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the tolerance is not positive.
    pub fn gap_policy(&self) -> Result<GapPolicy, ConfigError> {
        GapPolicy::new(self.sync.tolerance_ms, self.sync.single_record_caps)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. A missing variable
/// without a default becomes the empty string.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.sync.tolerance_ms <= 0 {
        return Err(ConfigError::ValidationError(
            "sync.tolerance_ms must be positive".to_string(),
        ));
    }

    if config.sync.page_limit == 0 {
        return Err(ConfigError::ValidationError(
            "sync.page_limit must be positive".to_string(),
        ));
    }

    if config.throttle.requests == 0 {
        return Err(ConfigError::ValidationError(
            "throttle.requests must be positive".to_string(),
        ));
    }

    if config.throttle.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "throttle.interval_secs must be positive".to_string(),
        ));
    }

    if config.source.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.base_url must not be empty".to_string(),
        ));
    }

    if config.store.path.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "store.path must not be empty".to_string(),
        ));
    }

    let retry = &config.source.retry;
    if !(0.0..=1.0).contains(&retry.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "source.retry.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }
    if retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "source.retry.backoff_multiplier must be at least 1.0".to_string(),
        ));
    }

    if let Some(market) = config.markets.iter().find(|m| m.symbol.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "markets: empty symbol for exchange '{}'",
            market.exchange
        )));
    }

    // Trades are tagged with the configured exchange, so it must name the
    // exchange they are actually fetched from.
    if let Some(market) = config
        .markets
        .iter()
        .find(|m| m.exchange != BITFINEX_EXCHANGE)
    {
        return Err(ConfigError::ValidationError(format!(
            "markets: unsupported exchange '{}' for symbol '{}' (only '{BITFINEX_EXCHANGE}' is available)",
            market.exchange, market.symbol
        )));
    }

    if let (Some(start), Some(end)) = (config.window.start, config.window.end)
        && start > end
    {
        return Err(ConfigError::ValidationError(format!(
            "window.start ({start}) must not be after window.end ({end})"
        )));
    }

    if config.window.start.is_none() && config.window.lookback_hours == 0 {
        return Err(ConfigError::ValidationError(
            "window.lookback_hours must be positive when window.start is unset".to_string(),
        ));
    }

    Ok(())
}
