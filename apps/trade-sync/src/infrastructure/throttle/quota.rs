//! Quota-based request throttle.
//!
//! Admissions are spaced evenly, one every `interval / requests`, so any
//! `requests + 1` consecutive admissions span at least `interval`. The
//! limiter has a burst of one: a caller that arrives after a quiet period
//! is admitted at once, but never ahead of the spacing.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::Mutex;
use tracing::trace;

use crate::application::ports::ThrottlePort;
use crate::error::SyncError;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Process-wide FIFO throttle.
///
/// Clones share the same quota.
#[derive(Clone)]
pub struct QuotaThrottle {
    limiter: Arc<Limiter>,
    // tokio's mutex queues waiters in arrival order.
    queue: Arc<Mutex<()>>,
    spacing: Duration,
}

impl QuotaThrottle {
    /// Allow `requests` admissions per `interval`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::InvalidPolicy` if `requests` is zero or the
    /// resulting spacing rounds down to zero.
    pub fn new(requests: u32, interval: Duration) -> Result<Self, SyncError> {
        if requests == 0 {
            return Err(SyncError::InvalidPolicy(
                "throttle requests must be positive".to_string(),
            ));
        }
        let spacing = spacing_for(requests, interval);
        let quota = Quota::with_period(spacing)
            .ok_or_else(|| {
                SyncError::InvalidPolicy(format!(
                    "throttle interval {interval:?} is too short for {requests} requests"
                ))
            })?
            .allow_burst(NonZeroU32::MIN);

        Ok(Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            queue: Arc::new(Mutex::new(())),
            spacing,
        })
    }

    /// Minimum time between two admissions.
    #[must_use]
    pub const fn spacing(&self) -> Duration {
        self.spacing
    }
}

/// `interval / requests`, rounded up to the next nanosecond so that
/// `requests` spacings never add up to less than `interval`.
fn spacing_for(requests: u32, interval: Duration) -> Duration {
    let nanos = interval.as_nanos().div_ceil(u128::from(requests));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

impl std::fmt::Debug for QuotaThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaThrottle")
            .field("spacing", &self.spacing)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ThrottlePort for QuotaThrottle {
    async fn admit(&self) {
        let _turn = self.queue.lock().await;
        self.limiter.until_ready().await;
        trace!(spacing_ms = self.spacing.as_millis(), "Request admitted");
    }
}

/// Throttle that admits every caller immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl ThrottlePort for Unthrottled {
    async fn admit(&self) {}
}
