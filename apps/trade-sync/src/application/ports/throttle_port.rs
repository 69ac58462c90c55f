//! Throttle Port (Driven Port)
//!
//! Process-wide admission gate in front of the trade source. One instance
//! is constructed at startup and shared by `Arc` with every fetcher.

use async_trait::async_trait;

/// Admission gate for outbound requests.
///
/// `admit` resolves when the caller may issue one request. Callers are
/// admitted in the order they started waiting.
#[async_trait]
pub trait ThrottlePort: Send + Sync {
    /// Wait for permission to issue one request.
    async fn admit(&self);
}
