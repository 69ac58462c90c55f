//! Bitfinex Adapter
//!
//! Public REST v2 trade history, implementing
//! [`TradeSourcePort`](crate::application::ports::TradeSourcePort).

mod api_types;
mod client;

pub use api_types::{BitfinexTradeRow, parse_error_message, parse_trades};
pub use client::{BITFINEX_EXCHANGE, BitfinexClient};
