//! Markets and the time window to sync.

use serde::{Deserialize, Serialize};

use crate::domain::MarketSelector;
use crate::infrastructure::bitfinex::BITFINEX_EXCHANGE;

/// One market to keep in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Exchange identifier.
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Market symbol (e.g., "tBTCUSD").
    pub symbol: String,
}

impl MarketConfig {
    /// Selector for this market.
    #[must_use]
    pub fn selector(&self) -> MarketSelector {
        MarketSelector::new(self.exchange.clone(), self.symbol.clone())
    }
}

fn default_exchange() -> String {
    BITFINEX_EXCHANGE.to_string()
}

/// Window to sync, in Unix milliseconds.
///
/// Explicit bounds win. A missing `end` means now; a missing `start`
/// means `lookback_hours` before the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Inclusive start.
    #[serde(default)]
    pub start: Option<i64>,
    /// Inclusive end.
    #[serde(default)]
    pub end: Option<i64>,
    /// Lookback used when `start` is absent.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
}

impl WindowConfig {
    /// Resolve to concrete `(start, end)` bounds relative to `now_ms`.
    #[must_use]
    pub fn resolve(&self, now_ms: i64) -> (i64, i64) {
        let end = self.end.unwrap_or(now_ms);
        let lookback_ms = i64::from(self.lookback_hours) * 60 * 60 * 1000;
        let start = self.start.unwrap_or_else(|| end.saturating_sub(lookback_ms));
        (start, end)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            lookback_hours: default_lookback_hours(),
        }
    }
}

const fn default_lookback_hours() -> u32 {
    24
}
