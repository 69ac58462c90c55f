//! Persistence Adapters
//!
//! Trade store implementations:
//!
//! - `sqlite`: durable store on a local database file (used by the binary)
//! - `in_memory`: process-local store for tests and one-off runs

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryTradeStore;
pub use sqlite::TursoTradeStore;
