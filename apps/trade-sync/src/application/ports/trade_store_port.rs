//! Trade Store Port (Driven Port)
//!
//! Interface for the local trade store: filtered range queries and
//! idempotent bulk inserts.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{MarketSelector, TimeRange, Trade};

/// Trade fields usable in filters and range keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeField {
    /// Exchange identifier.
    Exchange,
    /// Market symbol.
    Symbol,
    /// Execution timestamp.
    Mts,
}

impl fmt::Display for TradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exchange => write!(f, "exchange"),
            Self::Symbol => write!(f, "symbol"),
            Self::Mts => write!(f, "mts"),
        }
    }
}

/// Comparison operator in a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
}

/// One `(field, operator, value)` triple. A filter list is a conjunction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field to compare.
    pub field: TradeField,
    /// Operator.
    pub op: CompareOp,
    /// Right-hand value.
    pub value: String,
}

impl Predicate {
    /// `field = value`
    #[must_use]
    pub fn equals(field: TradeField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    /// `field != value`
    #[must_use]
    pub fn not_equals(field: TradeField, value: impl Into<String>) -> Self {
        Self {
            field,
            op: CompareOp::Ne,
            value: value.into(),
        }
    }

    /// Filters selecting one (exchange, symbol) partition.
    #[must_use]
    pub fn for_market(selector: &MarketSelector) -> Vec<Self> {
        vec![
            Self::equals(TradeField::Exchange, selector.exchange.clone()),
            Self::equals(TradeField::Symbol, selector.symbol.clone()),
        ]
    }
}

/// Inclusive range bound on a key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeQuery {
    /// Field the bounds apply to.
    pub key: TradeField,
    /// Inclusive lower bound.
    pub start: i64,
    /// Inclusive upper bound.
    pub end: i64,
}

impl RangeQuery {
    /// Range over the trade timestamp.
    #[must_use]
    pub const fn by_mts(range: TimeRange) -> Self {
        Self {
            key: TradeField::Mts,
            start: range.start(),
            end: range.end(),
        }
    }
}

/// Trade store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend unavailable.
    #[error("Trade store connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },

    /// Query or insert failed.
    #[error("Trade store query error: {message}")]
    Query {
        /// Error details.
        message: String,
    },

    /// The backend cannot evaluate a predicate or range key on this field.
    #[error("Unsupported filter on field '{field}'")]
    UnsupportedFilter {
        /// Offending field.
        field: TradeField,
    },
}

/// Port for trade persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeStorePort: Send + Sync {
    /// Trades matching all `filters` with `query.key` inside the bounds,
    /// ascending by key.
    async fn get_in_range(
        &self,
        filters: &[Predicate],
        query: RangeQuery,
    ) -> Result<Vec<Trade>, StoreError>;

    /// Insert trades and return how many were newly stored. Re-inserting a
    /// trade with an existing (exchange, symbol, mts) must not change counts
    /// or ordering, and is not counted.
    async fn bulk_insert(&self, trades: Vec<Trade>) -> Result<usize, StoreError>;
}
