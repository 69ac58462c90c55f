//! Throttled Fetcher Service
//!
//! Wraps a trade source so every request, retries included, first passes
//! through the shared throttle. Remote failures propagate unchanged unless
//! a retry policy is configured, in which case retryable failures are
//! re-queued after a backoff.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::ports::{FetchError, FetchRequest, ThrottlePort, TradeSourcePort};
use crate::domain::Trade;
use crate::observability::{record_fetch_retry, record_page_fetched};
use crate::retry::{ExponentialBackoffCalculator, RetryPolicy};

/// Trade source decorated with the process-wide throttle.
pub struct ThrottledFetcher<S>
where
    S: TradeSourcePort,
{
    source: Arc<S>,
    throttle: Arc<dyn ThrottlePort>,
    retry: RetryPolicy,
}

impl<S> ThrottledFetcher<S>
where
    S: TradeSourcePort,
{
    /// Create a fetcher that never retries.
    pub fn new(source: Arc<S>, throttle: Arc<dyn ThrottlePort>) -> Self {
        Self {
            source,
            throttle,
            retry: RetryPolicy::disabled(),
        }
    }

    /// Retry retryable failures according to `policy`.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Fetch one page, waiting for the throttle before each attempt.
    ///
    /// # Errors
    ///
    /// Returns the source's error once it is not retryable or the retry
    /// policy is used up.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Trade>, FetchError> {
        let mut backoff = ExponentialBackoffCalculator::new(&self.retry);

        loop {
            self.throttle.admit().await;
            debug!(request = %request, "Fetching trades");

            let error = match self.source.fetch_trades(request).await {
                Ok(trades) => {
                    record_page_fetched(&request.symbol);
                    return Ok(trades);
                }
                Err(e) => e,
            };

            if !error.is_retryable() || !backoff.has_remaining_attempts() {
                return Err(error);
            }

            let delay = match error.retry_after() {
                Some(server_delay) => {
                    backoff.consume_attempt();
                    server_delay
                }
                None => match backoff.next_backoff() {
                    Some(d) => d,
                    None => return Err(error),
                },
            };

            warn!(
                symbol = %request.symbol,
                attempt = backoff.current_attempt(),
                delay_ms = delay.as_millis(),
                error = %error,
                "Retrying trade fetch"
            );
            record_fetch_retry(&request.symbol);
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<S> TradeSourcePort for ThrottledFetcher<S>
where
    S: TradeSourcePort,
{
    async fn fetch_trades(&self, request: &FetchRequest) -> Result<Vec<Trade>, FetchError> {
        self.fetch(request).await
    }
}
