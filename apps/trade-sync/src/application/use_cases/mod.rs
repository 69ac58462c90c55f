//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod backfill_range;
mod sync_trades;

pub use backfill_range::RangeBackfiller;
pub use sync_trades::SyncTradesUseCase;
