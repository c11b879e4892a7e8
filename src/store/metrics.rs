use crate::models::metrics::MetricsState;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Monotonic upload/download/delete counters. Increments are atomic adds;
/// each one persists the full counter state with a fresh timestamp.
pub struct MetricsStore {
    path: PathBuf,
    upload_count: AtomicU64,
    download_count: AtomicU64,
    delete_count: AtomicU64,
    persist_lock: Mutex<()>,
}

impl MetricsStore {
    pub fn open(path: PathBuf) -> Self {
        let state: MetricsState = super::read_json_or_default(&path);
        Self {
            path,
            upload_count: AtomicU64::new(state.upload_count),
            download_count: AtomicU64::new(state.download_count),
            delete_count: AtomicU64::new(state.delete_count),
            persist_lock: Mutex::new(()),
        }
    }

    pub async fn record_upload(&self) {
        self.upload_count.fetch_add(1, Ordering::SeqCst);
        self.persist().await;
    }

    pub async fn record_download(&self) {
        self.download_count.fetch_add(1, Ordering::SeqCst);
        self.persist().await;
    }

    pub async fn record_delete(&self) {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        self.persist().await;
    }

    pub fn snapshot(&self) -> MetricsState {
        MetricsState {
            upload_count: self.upload_count.load(Ordering::SeqCst),
            download_count: self.download_count.load(Ordering::SeqCst),
            delete_count: self.delete_count.load(Ordering::SeqCst),
            last_updated: Some(Utc::now()),
        }
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let state = self.snapshot();
        if let Err(e) = super::write_json_atomic(&self.path, &state) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save metrics");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_survive_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("apiMetrics.json");

        let store = MetricsStore::open(path.clone());
        store.record_upload().await;
        store.record_upload().await;
        store.record_download().await;
        store.record_delete().await;

        let reloaded = MetricsStore::open(path);
        let state = reloaded.snapshot();
        assert_eq!(state.upload_count, 2);
        assert_eq!(state.download_count, 1);
        assert_eq!(state.delete_count, 1);
    }

    #[tokio::test]
    async fn corrupt_state_starts_at_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("apiMetrics.json");
        std::fs::write(&path, b"][").unwrap();

        let store = MetricsStore::open(path);
        assert_eq!(store.snapshot().upload_count, 0);
    }
}
