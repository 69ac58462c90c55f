//! Domain Layer
//!
//! Pure types and algorithms with zero infrastructure dependencies.
//!
//! - [`trade`]: `Trade`, `TimeRange` and `MarketSelector` value objects
//! - [`gaps`]: gap detection over stored trades
//! - [`cursor`]: the paginated backfill state machine
//! - [`report`]: per-gap and per-sync outcomes

pub mod cursor;
pub mod gaps;
pub mod report;
pub mod trade;

pub use cursor::{BackfillCursor, CursorStep};
pub use gaps::{
    DEFAULT_TOLERANCE_MS, GapPolicy, SingleRecordCaps, detect_gaps, detect_gaps_in_timestamps,
};
pub use report::{RangeCompletion, RangeOutcome, SyncReport};
pub use trade::{MarketSelector, TimeRange, Trade};
