use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobKind {
    /// One-shot deadline registered when a file is uploaded with an expiry.
    /// Firing runs an expired-record sweep, so stale names are harmless.
    ExpireFile { file_name: String },
    /// Remove every record whose expiry deadline has passed.
    PurgeExpired,
    /// Destructive full reset: all records, all ownership, all bytes.
    PurgeAll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of a cleanup or expiry pass. Per-file failures are counted,
/// never fatal to the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub deleted: u64,
    pub failed: u64,
    pub elapsed_ms: u64,
}
