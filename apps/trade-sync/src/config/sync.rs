//! Gap detection and paging configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_TOLERANCE_MS, SingleRecordCaps};

/// Gap detection and backfill paging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum spacing between stored trades before a gap is reported.
    #[serde(default = "default_tolerance_ms")]
    pub tolerance_ms: i64,
    /// Maximum trades requested per page.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Handling of a window that holds exactly one stored trade.
    #[serde(default)]
    pub single_record_caps: SingleRecordCaps,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tolerance_ms: default_tolerance_ms(),
            page_limit: default_page_limit(),
            single_record_caps: SingleRecordCaps::default(),
        }
    }
}

const fn default_tolerance_ms() -> i64 {
    DEFAULT_TOLERANCE_MS
}

const fn default_page_limit() -> u32 {
    5_000
}
