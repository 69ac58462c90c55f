//! SQLite trade store backed by `turso`.
//!
//! Trades live in a single `trades` table whose primary key is
//! `(exchange, symbol, mts)`. Inserts use `ON CONFLICT DO NOTHING`, so
//! re-inserting a trade keeps the stored row and is not counted.
//! Decimals are stored as text to keep their exact value.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};
use turso::{Builder, Connection, Database, Row, Value};

use crate::application::ports::{
    CompareOp, Predicate, RangeQuery, StoreError, TradeField, TradeStorePort,
};
use crate::domain::Trade;

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS trades (
    exchange TEXT NOT NULL,
    symbol   TEXT NOT NULL,
    mts      INTEGER NOT NULL,
    id       INTEGER NOT NULL,
    amount   TEXT NOT NULL,
    price    TEXT NOT NULL,
    PRIMARY KEY (exchange, symbol, mts)
)";

const INSERT_TRADE: &str = r"
INSERT INTO trades (exchange, symbol, mts, id, amount, price)
VALUES (?, ?, ?, ?, ?, ?)
ON CONFLICT (exchange, symbol, mts) DO NOTHING";

const SELECT_COLUMNS: &str = "SELECT id, mts, amount, price, exchange, symbol FROM trades";

/// Durable `TradeStorePort` on a local SQLite database.
pub struct TursoTradeStore {
    // Keeps the database open for the connection's lifetime.
    _db: Database,
    conn: Mutex<Connection>,
}

impl TursoTradeStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// `:memory:` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the database cannot be opened or
    /// the schema cannot be created.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(connection_error)?;
        let conn = db.connect().map_err(connection_error)?;
        conn.execute(CREATE_TABLE, ())
            .await
            .map_err(connection_error)?;

        info!(path, "Trade store opened");

        Ok(Self {
            _db: db,
            conn: Mutex::new(conn),
        })
    }

    /// Total trades stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` if the count fails.
    pub async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().await;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM trades", ())
            .await
            .map_err(query_error)?;
        let Some(row) = rows.next().await.map_err(query_error)? else {
            return Ok(0);
        };
        match row.get_value(0).map_err(query_error)? {
            Value::Integer(n) => Ok(n.unsigned_abs()),
            other => Err(StoreError::Query {
                message: format!("unexpected count value: {other:?}"),
            }),
        }
    }
}

impl std::fmt::Debug for TursoTradeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TursoTradeStore").finish_non_exhaustive()
    }
}

fn connection_error(err: turso::Error) -> StoreError {
    StoreError::Connection {
        message: err.to_string(),
    }
}

fn query_error(err: turso::Error) -> StoreError {
    StoreError::Query {
        message: err.to_string(),
    }
}

/// Column a predicate may filter on. The timestamp is only usable as the
/// range key.
const fn filter_column(field: TradeField) -> Result<&'static str, StoreError> {
    match field {
        TradeField::Exchange => Ok("exchange"),
        TradeField::Symbol => Ok("symbol"),
        TradeField::Mts => Err(StoreError::UnsupportedFilter { field }),
    }
}

/// Build the range query and its positional parameters.
fn select_statement(
    filters: &[Predicate],
    query: RangeQuery,
) -> Result<(String, Vec<Value>), StoreError> {
    if query.key != TradeField::Mts {
        return Err(StoreError::UnsupportedFilter { field: query.key });
    }

    let mut sql = format!("{SELECT_COLUMNS} WHERE mts >= ? AND mts <= ?");
    let mut params = vec![Value::Integer(query.start), Value::Integer(query.end)];
    for predicate in filters {
        let column = filter_column(predicate.field)?;
        let op = match predicate.op {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
        };
        sql.push_str(&format!(" AND {column} {op} ?"));
        params.push(Value::Text(predicate.value.clone()));
    }
    sql.push_str(" ORDER BY mts ASC, exchange ASC, symbol ASC");
    Ok((sql, params))
}

fn integer(row: &Row, idx: usize) -> Result<i64, StoreError> {
    match row.get_value(idx).map_err(query_error)? {
        Value::Integer(v) => Ok(v),
        other => Err(StoreError::Query {
            message: format!("column {idx}: expected integer, got {other:?}"),
        }),
    }
}

fn text(row: &Row, idx: usize) -> Result<String, StoreError> {
    match row.get_value(idx).map_err(query_error)? {
        Value::Text(v) => Ok(v),
        other => Err(StoreError::Query {
            message: format!("column {idx}: expected text, got {other:?}"),
        }),
    }
}

fn decimal(row: &Row, idx: usize) -> Result<Decimal, StoreError> {
    let raw = text(row, idx)?;
    Decimal::from_str(&raw).map_err(|e| StoreError::Query {
        message: format!("column {idx}: invalid decimal '{raw}': {e}"),
    })
}

fn trade_from_row(row: &Row) -> Result<Trade, StoreError> {
    Ok(Trade {
        id: integer(row, 0)?,
        mts: integer(row, 1)?,
        amount: decimal(row, 2)?,
        price: decimal(row, 3)?,
        exchange: text(row, 4)?,
        symbol: text(row, 5)?,
    })
}

fn insert_params(trade: &Trade) -> Vec<Value> {
    vec![
        Value::Text(trade.exchange.clone()),
        Value::Text(trade.symbol.clone()),
        Value::Integer(trade.mts),
        Value::Integer(trade.id),
        Value::Text(trade.amount.to_string()),
        Value::Text(trade.price.to_string()),
    ]
}

async fn insert_all(conn: &Connection, trades: &[Trade]) -> Result<usize, StoreError> {
    let mut stored = 0;
    for trade in trades {
        let changed = conn
            .execute(INSERT_TRADE, turso::params_from_iter(insert_params(trade)))
            .await
            .map_err(query_error)?;
        stored += changed as usize;
    }
    Ok(stored)
}

#[async_trait]
impl TradeStorePort for TursoTradeStore {
    async fn get_in_range(
        &self,
        filters: &[Predicate],
        query: RangeQuery,
    ) -> Result<Vec<Trade>, StoreError> {
        let (sql, params) = select_statement(filters, query)?;
        if query.start > query.end {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;
        let mut rows = conn
            .query(&sql, turso::params_from_iter(params))
            .await
            .map_err(query_error)?;

        let mut found = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_error)? {
            found.push(trade_from_row(&row)?);
        }
        Ok(found)
    }

    async fn bulk_insert(&self, trades: Vec<Trade>) -> Result<usize, StoreError> {
        if trades.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().await;
        conn.execute("BEGIN", ()).await.map_err(query_error)?;
        match insert_all(&conn, &trades).await {
            Ok(stored) => {
                conn.execute("COMMIT", ()).await.map_err(query_error)?;
                Ok(stored)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute("ROLLBACK", ()).await {
                    warn!(error = %rollback, "Rollback after failed insert also failed");
                }
                Err(e)
            }
        }
    }
}
