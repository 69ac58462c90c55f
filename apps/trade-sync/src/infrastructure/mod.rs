//! Infrastructure Layer
//!
//! Adapters implementing the ports defined in the application layer:
//!
//! - `bitfinex/`: Remote trade source (public REST v2)
//! - `persistence/`: Trade store adapters
//! - `throttle/`: Shared request throttle

pub mod bitfinex;
pub mod persistence;
pub mod throttle;

pub use bitfinex::BitfinexClient;
pub use persistence::{InMemoryTradeStore, TursoTradeStore};
pub use throttle::{QuotaThrottle, Unthrottled};
