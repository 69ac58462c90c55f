//! Trade store configuration.

use serde::{Deserialize, Serialize};

/// Where synced trades are kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file. `:memory:` keeps trades for one run only.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl StoreConfig {
    /// Whether the database lives only in memory.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.path == ":memory:"
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "trades.db".to_string()
}
