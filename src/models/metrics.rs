use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic API usage counters, persisted in full on every increment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsState {
    pub upload_count: u64,
    pub download_count: u64,
    pub delete_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}
