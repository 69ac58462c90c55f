//! Paginated backfill cursor.
//!
//! The cursor is the last confirmed timestamp inside a gap. Each page is
//! requested strictly after it, so pages must be fetched one at a time.

use super::trade::TimeRange;
use crate::error::SyncError;

/// What the backfill loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStep {
    /// Fetch the next page of trades strictly after `from_exclusive`.
    Continue {
        /// Exclusive lower bound for the next fetch.
        from_exclusive: i64,
    },
    /// The cursor reached the end of the range.
    Done,
    /// The source returned an empty page before the range end was reached.
    Exhausted,
}

impl CursorStep {
    /// Whether the loop has stopped.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue { .. })
    }
}

/// Cursor over one gap range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackfillCursor {
    cursor: i64,
    target: i64,
}

impl BackfillCursor {
    /// Position the cursor just before `range.start`.
    #[must_use]
    pub const fn new(range: TimeRange) -> Self {
        Self {
            cursor: range.start().saturating_sub(1),
            target: range.end(),
        }
    }

    /// Last confirmed timestamp.
    #[must_use]
    pub const fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Inclusive upper bound of the range.
    #[must_use]
    pub const fn target(&self) -> i64 {
        self.target
    }

    /// Step implied by the current position.
    #[must_use]
    pub const fn next_step(&self) -> CursorStep {
        if self.cursor < self.target {
            CursorStep::Continue {
                from_exclusive: self.cursor,
            }
        } else {
            CursorStep::Done
        }
    }

    /// Record a fetched page by its last timestamp (`None` for an empty page).
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StalledCursor` if the page does not move the
    /// cursor forward.
    pub fn advance(&mut self, page_last_mts: Option<i64>) -> Result<CursorStep, SyncError> {
        let Some(last_mts) = page_last_mts else {
            return Ok(CursorStep::Exhausted);
        };
        if last_mts <= self.cursor {
            return Err(SyncError::StalledCursor {
                cursor: self.cursor,
                last_mts,
            });
        }
        self.cursor = last_mts;
        Ok(self.next_step())
    }
}
