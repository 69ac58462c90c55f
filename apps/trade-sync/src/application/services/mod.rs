//! Application Services
//!
//! Services decorate ports with cross-cutting behaviour shared by the use
//! cases.

mod throttled_fetcher;

pub use throttled_fetcher::ThrottledFetcher;
