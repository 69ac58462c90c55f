//! Bitfinex public API response types.
//!
//! Bitfinex v2 answers with positional arrays rather than objects:
//!
//! | Endpoint | Row |
//! |----------|-----|
//! | `/v2/trades/t*/hist` | `[ID, MTS, AMOUNT, PRICE]` |
//! | `/v2/trades/f*/hist` | `[ID, MTS, AMOUNT, RATE, PERIOD]` |
//! | any error | `["error", CODE, "message"]` |

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::Trade;

/// One decoded trade row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitfinexTradeRow {
    /// Trade ID.
    pub id: i64,
    /// Execution time in Unix milliseconds.
    pub mts: i64,
    /// Signed amount, negative for sells.
    pub amount: Decimal,
    /// Price, or rate for funding trades.
    pub price: Decimal,
}

impl BitfinexTradeRow {
    /// Convert into a domain trade for the given partition.
    #[must_use]
    pub fn into_trade(self, exchange: &str, symbol: &str) -> Trade {
        Trade {
            id: self.id,
            mts: self.mts,
            amount: self.amount,
            price: self.price,
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Decode a trades response body.
///
/// # Errors
///
/// Returns a description of the first malformed row.
pub fn parse_trades(body: &str) -> Result<Vec<BitfinexTradeRow>, String> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|e| format!("expected array of rows: {e}"))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_row(row).map_err(|e| format!("row {i}: {e}")))
        .collect()
}

fn parse_row(row: &[Value]) -> Result<BitfinexTradeRow, String> {
    if row.len() < 4 {
        return Err(format!("expected at least 4 fields, got {}", row.len()));
    }
    Ok(BitfinexTradeRow {
        id: integer(&row[0], "ID")?,
        mts: integer(&row[1], "MTS")?,
        amount: decimal(&row[2], "AMOUNT")?,
        price: decimal(&row[3], "PRICE")?,
    })
}

fn integer(value: &Value, field: &str) -> Result<i64, String> {
    value
        .as_i64()
        .ok_or_else(|| format!("{field} is not an integer: {value}"))
}

fn decimal(value: &Value, field: &str) -> Result<Decimal, String> {
    let Value::Number(number) = value else {
        return Err(format!("{field} is not a number: {value}"));
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| format!("{field} out of range ({text}): {e}"))
}

/// Extract the message from an `["error", CODE, "message"]` body.
#[must_use]
pub fn parse_error_message(body: &str) -> Option<String> {
    let parts: Vec<Value> = serde_json::from_str(body).ok()?;
    match parts.as_slice() {
        [Value::String(tag), code, Value::String(message), ..] if tag == "error" => {
            Some(format!("{message} (code {code})"))
        }
        _ => None,
    }
}
