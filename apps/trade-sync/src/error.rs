//! Error handling for trade sync.
//!
//! Collaborator failures (remote fetch, store) propagate unchanged inside
//! [`SyncError`]; the core adds no translation beyond wrapping. Each error
//! maps to a stable [`ErrorCode`] for structured logs.
//!
//! | Code | Cause |
//! |------|-------|
//! | `INVALID_WINDOW` | Sync window with `start > end` |
//! | `INVALID_RANGE` | Range constructed with `start > end` |
//! | `INVALID_POLICY` | Non-positive gap tolerance or page limit |
//! | `FETCH_FAILED` | Remote trade source failure |
//! | `STORE_FAILED` | Local store query or insert failure |
//! | `STALLED_CURSOR` | Source page did not advance the backfill cursor |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{FetchError, StoreError};

/// Error codes for trade sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Sync window bounds are inverted.
    InvalidWindow,
    /// Range bounds are inverted.
    InvalidRange,
    /// Gap policy or page limit is invalid.
    InvalidPolicy,
    /// Remote fetch failed.
    FetchFailed,
    /// Store operation failed.
    StoreFailed,
    /// Backfill cursor did not advance.
    StalledCursor,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::InvalidRange => "INVALID_RANGE",
            Self::InvalidPolicy => "INVALID_POLICY",
            Self::FetchFailed => "FETCH_FAILED",
            Self::StoreFailed => "STORE_FAILED",
            Self::StalledCursor => "STALLED_CURSOR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by gap detection and backfill.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Sync window has `start > end`.
    #[error("Invalid sync window: start {start} is after end {end}")]
    InvalidWindow {
        /// Requested start.
        start: i64,
        /// Requested end.
        end: i64,
    },

    /// Range has `start > end`.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Range start.
        start: i64,
        /// Range end.
        end: i64,
    },

    /// Gap policy or backfill parameters are invalid.
    #[error("Invalid sync policy: {0}")]
    InvalidPolicy(String),

    /// Remote trade source failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Local store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A fetched page ended at or before the cursor.
    #[error("Backfill cursor stalled at {cursor}: page ended at {last_mts}")]
    StalledCursor {
        /// Cursor before the page.
        cursor: i64,
        /// Last timestamp in the page.
        last_mts: i64,
    },
}

impl SyncError {
    /// Stable code for logs.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidWindow { .. } => ErrorCode::InvalidWindow,
            Self::InvalidRange { .. } => ErrorCode::InvalidRange,
            Self::InvalidPolicy(_) => ErrorCode::InvalidPolicy,
            Self::Fetch(_) => ErrorCode::FetchFailed,
            Self::Store(_) => ErrorCode::StoreFailed,
            Self::StalledCursor { .. } => ErrorCode::StalledCursor,
        }
    }
}
