//! Logging and metrics configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Metrics exporter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Prometheus listener address. No exporter is started when unset.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}
