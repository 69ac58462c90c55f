//! Trade Source Port (Driven Port)
//!
//! Interface for the remote, paginated trade history feed.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Trade;
use crate::retry::is_retryable_status;

/// Ordering of a fetched page by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Oldest first.
    #[default]
    Ascending,
    /// Newest first.
    Descending,
}

impl SortDirection {
    /// Numeric form used by exchange REST APIs (`1` / `-1`).
    #[must_use]
    pub const fn as_signum(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// One page request against the trade source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Market symbol.
    pub symbol: String,
    /// Trades at or before this timestamp are excluded.
    pub from_exclusive: i64,
    /// Trades after this timestamp are excluded.
    pub to_inclusive: i64,
    /// Maximum trades returned.
    pub limit: u32,
    /// Page ordering.
    pub sort: SortDirection,
}

impl FetchRequest {
    /// Ascending page request, the only shape backfill issues.
    #[must_use]
    pub fn ascending(
        symbol: impl Into<String>,
        from_exclusive: i64,
        to_inclusive: i64,
        limit: u32,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            from_exclusive,
            to_inclusive,
            limit,
            sort: SortDirection::Ascending,
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}] limit={}",
            self.symbol, self.from_exclusive, self.to_inclusive, self.limit
        )
    }
}

/// Trade source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, reset).
    #[error("Trade source network error: {message}")]
    Network {
        /// Error details.
        message: String,
    },

    /// Rate limited by the remote API.
    #[error("Trade source rate limited")]
    RateLimited {
        /// Seconds to wait before retrying, if the API said so.
        retry_after_secs: Option<u64>,
    },

    /// Non-success HTTP response.
    #[error("Trade source API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },

    /// Response body could not be decoded into trades.
    #[error("Failed to decode trade source response: {message}")]
    Decode {
        /// Error details.
        message: String,
    },
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => is_retryable_status(*status),
            Self::Decode { .. } => false,
        }
    }

    /// Server-requested delay before the next attempt.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Port for fetching historical trades.
///
/// Implementations return at most `limit` trades within
/// `(from_exclusive, to_inclusive]`, ordered per `sort`. An empty page means
/// no more data exists in the window; it is not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeSourcePort: Send + Sync {
    /// Fetch one page of trades.
    async fn fetch_trades(&self, request: &FetchRequest) -> Result<Vec<Trade>, FetchError>;
}
