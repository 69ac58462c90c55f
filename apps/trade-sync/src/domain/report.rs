//! Outcome of backfilling ranges and syncing a window.

use serde::Serialize;

use super::trade::{MarketSelector, TimeRange};

/// How a gap's backfill ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCompletion {
    /// The cursor reached the end of the range.
    Completed,
    /// The source returned an empty page first. Whatever is left of the
    /// range is picked up by the next sync, if the data ever appears.
    Exhausted,
    /// Cancellation was requested before the range finished.
    Cancelled,
}

/// Per-gap backfill result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeOutcome {
    /// The gap that was backfilled.
    pub range: TimeRange,
    /// Non-empty pages fetched.
    pub pages: usize,
    /// Trades handed to the store.
    pub trades: usize,
    /// Terminal state.
    pub completion: RangeCompletion,
}

impl RangeOutcome {
    /// Outcome of a range that was never started.
    #[must_use]
    pub const fn cancelled(range: TimeRange) -> Self {
        Self {
            range,
            pages: 0,
            trades: 0,
            completion: RangeCompletion::Cancelled,
        }
    }
}

/// Result of one `sync` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Partition that was synced.
    pub selector: MarketSelector,
    /// Requested window.
    pub window: TimeRange,
    /// One entry per detected gap, in detection order.
    pub ranges: Vec<RangeOutcome>,
}

impl SyncReport {
    /// Report for a window with nothing missing.
    #[must_use]
    pub const fn up_to_date(selector: MarketSelector, window: TimeRange) -> Self {
        Self {
            selector,
            window,
            ranges: Vec::new(),
        }
    }

    /// Whether no gap was found.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Trades inserted across every gap.
    #[must_use]
    pub fn total_trades(&self) -> usize {
        self.ranges.iter().map(|r| r.trades).sum()
    }

    /// Pages fetched across every gap.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.ranges.iter().map(|r| r.pages).sum()
    }

    /// Whether every gap reached a terminal state without cancellation.
    #[must_use]
    pub fn fully_completed(&self) -> bool {
        self.ranges
            .iter()
            .all(|r| r.completion != RangeCompletion::Cancelled)
    }
}
