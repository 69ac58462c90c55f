//! Backfill Range Use Case
//!
//! Pages one gap in from the trade source, strictly in order. Each page is
//! requested after the last timestamp of the previous one and persisted
//! before the next request, so a failure part-way through keeps whatever
//! was already fetched.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::ports::{FetchRequest, TradeSourcePort, TradeStorePort};
use crate::domain::{
    BackfillCursor, CursorStep, MarketSelector, RangeCompletion, RangeOutcome, TimeRange, Trade,
};
use crate::error::SyncError;
use crate::observability::{record_range_exhausted, record_trades_stored};

/// Use case for backfilling a single gap.
pub struct RangeBackfiller<S, St>
where
    S: TradeSourcePort,
    St: TradeStorePort,
{
    source: Arc<S>,
    store: Arc<St>,
    page_limit: u32,
    cancel: Option<CancellationToken>,
}

impl<S, St> RangeBackfiller<S, St>
where
    S: TradeSourcePort,
    St: TradeStorePort,
{
    /// Create a new `RangeBackfiller` requesting `page_limit` trades per page.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPolicy` if `page_limit` is zero.
    pub fn new(source: Arc<S>, store: Arc<St>, page_limit: u32) -> Result<Self, SyncError> {
        if page_limit == 0 {
            return Err(SyncError::InvalidPolicy(
                "page limit must be positive".to_string(),
            ));
        }
        Ok(Self {
            source,
            store,
            page_limit,
            cancel: None,
        })
    }

    /// Stop between pages once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Trades requested per page.
    pub const fn page_limit(&self) -> u32 {
        self.page_limit
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Fetch and persist every trade in `range` for `selector`.
    ///
    /// An empty page ends the range without error even if the cursor has
    /// not reached `range.end()`.
    ///
    /// # Errors
    ///
    /// - `SyncError::Fetch` / `SyncError::Store` as returned by the ports;
    ///   pages inserted before the failure stay inserted.
    /// - `SyncError::StalledCursor` if a page does not move past the cursor.
    pub async fn backfill(
        &self,
        range: TimeRange,
        selector: &MarketSelector,
    ) -> Result<RangeOutcome, SyncError> {
        let mut cursor = BackfillCursor::new(range);
        let mut outcome = RangeOutcome {
            range,
            pages: 0,
            trades: 0,
            completion: RangeCompletion::Completed,
        };

        let mut step = cursor.next_step();
        while let CursorStep::Continue { from_exclusive } = step {
            if self.is_cancelled() {
                info!(
                    market = %selector,
                    range = %range,
                    cursor = from_exclusive,
                    "Backfill cancelled"
                );
                outcome.completion = RangeCompletion::Cancelled;
                return Ok(outcome);
            }

            let request = FetchRequest::ascending(
                selector.symbol.clone(),
                from_exclusive,
                cursor.target(),
                self.page_limit,
            );
            let page = self.source.fetch_trades(&request).await?;
            step = cursor.advance(page.last().map(|t| t.mts))?;

            if page.is_empty() {
                continue;
            }

            let count = page.len();
            let tagged: Vec<Trade> = page.into_iter().map(|t| t.tagged(selector)).collect();
            let stored = self.store.bulk_insert(tagged).await?;

            outcome.pages += 1;
            outcome.trades += count;
            record_trades_stored(&selector.symbol, stored);
            debug!(
                market = %selector,
                count,
                stored,
                cursor = cursor.cursor(),
                target = cursor.target(),
                "Inserted trade page"
            );
        }

        if step == CursorStep::Exhausted {
            info!(
                market = %selector,
                range = %range,
                cursor = cursor.cursor(),
                "Source exhausted before range end"
            );
            record_range_exhausted(&selector.symbol);
            outcome.completion = RangeCompletion::Exhausted;
        }

        Ok(outcome)
    }
}
