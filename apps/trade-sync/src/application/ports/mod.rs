//! Application Ports (Driven)
//!
//! Ports define how the application uses external systems:
//! the remote trade feed, the local store and the request throttle.

mod throttle_port;
mod trade_source_port;
mod trade_store_port;

pub use throttle_port::ThrottlePort;
pub use trade_source_port::{FetchError, FetchRequest, SortDirection, TradeSourcePort};
pub use trade_store_port::{
    CompareOp, Predicate, RangeQuery, StoreError, TradeField, TradeStorePort,
};

#[cfg(test)]
pub use trade_source_port::MockTradeSourcePort;
#[cfg(test)]
pub use trade_store_port::MockTradeStorePort;
