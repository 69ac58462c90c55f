//! Outbound request quota.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// At most `requests` fetches per `interval_secs`, shared by every market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Requests allowed per interval.
    #[serde(default = "default_requests")]
    pub requests: u32,
    /// Interval length in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl ThrottleConfig {
    /// Interval as a `Duration`.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            interval_secs: default_interval_secs(),
        }
    }
}

const fn default_requests() -> u32 {
    10
}

const fn default_interval_secs() -> u64 {
    60
}
