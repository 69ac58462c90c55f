// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Trade Sync - Rust Core Library
//!
//! Keeps a local store of public exchange trades complete over a time
//! window by detecting missing ranges and backfilling them from a
//! rate-limited, paginated remote feed.
//!
//! # Architecture (Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure types and algorithms
//!   - `trade`: `Trade`, `TimeRange`, `MarketSelector`
//!   - `gaps`: Gap detection with a spacing tolerance
//!   - `cursor`: Paginated backfill state machine
//!   - `report`: Per-gap and per-sync outcomes
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `TradeSourcePort`, `TradeStorePort`, `ThrottlePort`
//!   - `services`: `ThrottledFetcher` (throttle + optional retry)
//!   - `use_cases`: `SyncTradesUseCase`, `RangeBackfiller`
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `bitfinex`: Public REST v2 trade history client
//!   - `persistence`: In-memory trade store
//!   - `throttle`: Quota throttle (`governor`)
//!
//! # Data flow
//!
//! ```text
//! sync(selector, window)
//!   → store.get_in_range → detect_gaps
//!   → for each gap: RangeBackfiller
//!       → ThrottledFetcher (admit → fetch) → store.bulk_insert
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Hexagonal Layers
// =============================================================================

/// Domain layer - Core logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Error types.
pub mod error;

/// Logging and metrics.
pub mod observability;

/// Retry policy and backoff.
pub mod retry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::ports::{
    FetchError, FetchRequest, StoreError, ThrottlePort, TradeSourcePort, TradeStorePort,
};
pub use application::services::ThrottledFetcher;
pub use application::use_cases::{RangeBackfiller, SyncTradesUseCase};
pub use domain::{
    GapPolicy, MarketSelector, RangeCompletion, RangeOutcome, SingleRecordCaps, SyncReport,
    TimeRange, Trade, detect_gaps,
};
pub use error::{ErrorCode, SyncError};
