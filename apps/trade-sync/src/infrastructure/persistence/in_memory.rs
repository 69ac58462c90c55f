//! In-memory trade store.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::application::ports::{
    CompareOp, Predicate, RangeQuery, StoreError, TradeField, TradeStorePort,
};
use crate::domain::{MarketSelector, Trade};

/// Trades of one (exchange, symbol) partition keyed by timestamp.
type Partition = BTreeMap<i64, Trade>;

/// In-memory implementation of `TradeStorePort`.
///
/// Partitions are keyed by market and each keeps at most one trade per
/// millisecond: re-inserting an existing `(exchange, symbol, mts)` leaves
/// the stored trade untouched.
#[derive(Debug, Default)]
pub struct InMemoryTradeStore {
    partitions: RwLock<HashMap<MarketSelector, Partition>>,
}

impl InMemoryTradeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total trades across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trades stored for one market.
    #[must_use]
    pub fn partition_len(&self, selector: &MarketSelector) -> usize {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(selector)
            .map_or(0, BTreeMap::len)
    }
}

fn predicate_matches(predicate: &Predicate, market: &MarketSelector) -> Result<bool, StoreError> {
    let actual = match predicate.field {
        TradeField::Exchange => &market.exchange,
        TradeField::Symbol => &market.symbol,
        TradeField::Mts => {
            return Err(StoreError::UnsupportedFilter {
                field: predicate.field,
            });
        }
    };
    Ok(match predicate.op {
        CompareOp::Eq => *actual == predicate.value,
        CompareOp::Ne => *actual != predicate.value,
    })
}

#[async_trait]
impl TradeStorePort for InMemoryTradeStore {
    async fn get_in_range(
        &self,
        filters: &[Predicate],
        query: RangeQuery,
    ) -> Result<Vec<Trade>, StoreError> {
        if query.key != TradeField::Mts {
            return Err(StoreError::UnsupportedFilter { field: query.key });
        }
        if query.start > query.end {
            return Ok(Vec::new());
        }

        let partitions = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        let mut found = Vec::new();
        for (market, partition) in partitions.iter() {
            let mut selected = true;
            for predicate in filters {
                selected &= predicate_matches(predicate, market)?;
            }
            if selected {
                found.extend(
                    partition
                        .range(query.start..=query.end)
                        .map(|(_, trade)| trade.clone()),
                );
            }
        }

        // Several partitions may match a `Ne` filter.
        found.sort_by_key(|t| t.mts);
        Ok(found)
    }

    async fn bulk_insert(&self, trades: Vec<Trade>) -> Result<usize, StoreError> {
        let mut partitions = self
            .partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut stored = 0;
        for trade in trades {
            let market = MarketSelector::new(trade.exchange.clone(), trade.symbol.clone());
            if let Entry::Vacant(slot) = partitions.entry(market).or_default().entry(trade.mts) {
                slot.insert(trade);
                stored += 1;
            }
        }
        Ok(stored)
    }
}
