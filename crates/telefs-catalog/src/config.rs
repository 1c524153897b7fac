use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for [`CatalogStore`](crate::CatalogStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// How many recent channel messages a lookup scans for the latest
    /// snapshot. A snapshot older than this window is invisible.
    pub lookback_window: usize,
    /// Conflicting publish attempts before giving up, and separately the
    /// number of merge follow-ups after a racing snapshot.
    pub max_conflict_retries: u32,
    /// Make lookups fail with `WindowExhausted` instead of returning an
    /// empty catalog when a full window holds no snapshot. Writes refuse an
    /// exhausted window either way.
    pub strict_window: bool,
    /// Upper bound of the random pause between conflicting attempts,
    /// multiplied by the attempt number.
    pub conflict_backoff: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            lookback_window: 100,
            max_conflict_retries: 8,
            strict_window: false,
            conflict_backoff: Duration::from_millis(50),
        }
    }
}
