//! Trade records, time ranges and market selectors.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// A single public trade within one (exchange, symbol) partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Trade ID assigned by the exchange.
    pub id: i64,
    /// Execution time in Unix milliseconds.
    pub mts: i64,
    /// Signed amount (negative for sells).
    pub amount: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Exchange identifier (e.g., "bitfinex").
    pub exchange: String,
    /// Market symbol (e.g., "tBTCUSD").
    pub symbol: String,
}

impl Trade {
    /// Re-tag the trade with the given partition.
    #[must_use]
    pub fn tagged(mut self, selector: &MarketSelector) -> Self {
        self.exchange.clone_from(&selector.exchange);
        self.symbol.clone_from(&selector.symbol);
        self
    }
}

/// An inclusive millisecond interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Create a new range.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidRange` if `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self, SyncError> {
        if start > end {
            return Err(SyncError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    /// Number of milliseconds covered (always at least 1).
    #[must_use]
    pub const fn len_ms(&self) -> u64 {
        self.end.abs_diff(self.start) + 1
    }

    /// Whether `mts` falls inside the range.
    #[must_use]
    pub const fn contains(&self, mts: i64) -> bool {
        mts >= self.start && mts <= self.end
    }

    /// Whether `other` lies entirely inside this range.
    #[must_use]
    pub const fn encloses(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Build a range only when the bounds are non-empty.
    pub(crate) const fn non_empty(start: i64, end: i64) -> Option<Self> {
        if start > end {
            None
        } else {
            Some(Self { start, end })
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Identifies the partition a sync operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketSelector {
    /// Exchange identifier.
    pub exchange: String,
    /// Market symbol.
    pub symbol: String,
}

impl MarketSelector {
    /// Create a new selector.
    #[must_use]
    pub fn new(exchange: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for MarketSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}
