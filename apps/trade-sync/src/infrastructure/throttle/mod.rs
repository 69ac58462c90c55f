//! Throttle Adapters
//!
//! Implementations of [`ThrottlePort`](crate::application::ports::ThrottlePort).

mod quota;

pub use quota::{QuotaThrottle, Unthrottled};
