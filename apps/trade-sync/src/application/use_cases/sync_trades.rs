//! Sync Trades Use Case
//!
//! Brings one (exchange, symbol) partition up to date over a window:
//! query what is stored, detect the gaps, then backfill them one after
//! another in detection order.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::backfill_range::RangeBackfiller;
use crate::application::ports::{Predicate, RangeQuery, TradeSourcePort, TradeStorePort};
use crate::domain::{GapPolicy, MarketSelector, RangeOutcome, SyncReport, TimeRange, detect_gaps};
use crate::error::SyncError;
use crate::observability::record_gaps_detected;

/// Use case for syncing a window of trades.
pub struct SyncTradesUseCase<S, St>
where
    S: TradeSourcePort,
    St: TradeStorePort,
{
    store: Arc<St>,
    backfiller: RangeBackfiller<S, St>,
    policy: GapPolicy,
}

impl<S, St> SyncTradesUseCase<S, St>
where
    S: TradeSourcePort,
    St: TradeStorePort,
{
    /// Create a new `SyncTradesUseCase`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPolicy` if `page_limit` is zero.
    pub fn new(
        source: Arc<S>,
        store: Arc<St>,
        policy: GapPolicy,
        page_limit: u32,
    ) -> Result<Self, SyncError> {
        let backfiller = RangeBackfiller::new(source, Arc::clone(&store), page_limit)?;
        Ok(Self {
            store,
            backfiller,
            policy,
        })
    }

    /// Stop between gaps and between pages once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.backfiller = self.backfiller.with_cancellation(token);
        self
    }

    /// Gaps currently missing from the store for `selector` in `window`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the range query fails.
    pub async fn find_gaps(
        &self,
        selector: &MarketSelector,
        window: TimeRange,
    ) -> Result<Vec<TimeRange>, SyncError> {
        let filters = Predicate::for_market(selector);
        let existing = self
            .store
            .get_in_range(&filters, RangeQuery::by_mts(window))
            .await?;
        Ok(detect_gaps(&existing, window, &self.policy))
    }

    /// Sync `[window_start, window_end]` for `selector`.
    ///
    /// Safe to call repeatedly: a second call re-detects whatever is still
    /// missing.
    ///
    /// # Errors
    ///
    /// - `SyncError::InvalidWindow` if `window_start > window_end`
    /// - `SyncError::Store` / `SyncError::Fetch` from the ports; the
    ///   current gap is abandoned and later gaps are not attempted.
    /// - `SyncError::StalledCursor` if the source stops making progress.
    pub async fn sync(
        &self,
        selector: &MarketSelector,
        window_start: i64,
        window_end: i64,
    ) -> Result<SyncReport, SyncError> {
        let window = TimeRange::new(window_start, window_end).map_err(|_| {
            SyncError::InvalidWindow {
                start: window_start,
                end: window_end,
            }
        })?;

        let gaps = self.find_gaps(selector, window).await?;
        if gaps.is_empty() {
            info!(market = %selector, window = %window, "Trades up to date");
            return Ok(SyncReport::up_to_date(selector.clone(), window));
        }

        record_gaps_detected(&selector.symbol, gaps.len());
        info!(
            market = %selector,
            window = %window,
            gaps = gaps.len(),
            "Syncing trade gaps"
        );

        let mut ranges = Vec::with_capacity(gaps.len());
        for gap in gaps {
            if self.backfiller.is_cancelled() {
                ranges.push(RangeOutcome::cancelled(gap));
                continue;
            }
            ranges.push(self.backfiller.backfill(gap, selector).await?);
        }

        let report = SyncReport {
            selector: selector.clone(),
            window,
            ranges,
        };
        info!(
            market = %selector,
            pages = report.total_pages(),
            trades = report.total_trades(),
            completed = report.fully_completed(),
            "Trade sync finished"
        );
        Ok(report)
    }
}
