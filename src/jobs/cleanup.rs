use crate::models::job::CleanupReport;
use crate::state::AppState;
use chrono::Utc;
use std::time::Instant;

/// Remove every record whose expiry deadline has passed: bytes, metadata
/// record, and ownership references. Each file's outcome is independent;
/// a locked or missing file is logged and counted, never fatal.
pub async fn purge_expired(state: &AppState) -> CleanupReport {
    let started = Instant::now();
    let now = Utc::now();

    let expired = state.files.expired_before(now).await;
    if expired.is_empty() {
        return CleanupReport::default();
    }

    let mut report = CleanupReport::default();
    for record in expired {
        let disk_path = state.config.uploads_dir().join(&record.file_name);
        match tokio::fs::remove_file(&disk_path).await {
            Ok(()) => {
                report.deleted += 1;
                tracing::debug!(
                    file = %record.file_name,
                    expired_at = ?record.expiry_time,
                    "Expired file removed"
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    file = %record.file_name,
                    error = %e,
                    "Failed to remove expired file"
                );
            }
        }

        // The record is past its deadline either way; keep the stores
        // reconciled with what expiry promised.
        state.files.remove(&record.file_name).await;
        state.users.remove_file_from_user(&record.file_path).await;
        state.jobs.deregister_file(&record.file_name).await;
    }

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        deleted = report.deleted,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms,
        "Expired-file cleanup completed"
    );
    report
}

/// Destructive full reset: every file in the uploads directory is deleted,
/// the metadata document is emptied, and every user's owned set is
/// cleared. Aborts early only when the uploads directory itself is gone.
pub async fn purge_all(state: &AppState) -> CleanupReport {
    let started = Instant::now();
    let uploads_dir = state.config.uploads_dir();

    if !uploads_dir.exists() {
        tracing::warn!(dir = %uploads_dir.display(), "Uploads directory missing, nothing to clean");
        return CleanupReport::default();
    }

    let mut report = CleanupReport::default();
    match std::fs::read_dir(&uploads_dir) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {
                        report.deleted += 1;
                        tracing::debug!(file = %path.display(), "File removed by cleanup");
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(file = %path.display(), error = %e, "Cleanup failed to remove file");
                    }
                }
            }
        }
        Err(e) => {
            tracing::error!(dir = %uploads_dir.display(), error = %e, "Cleanup could not list uploads directory");
            return report;
        }
    }

    state.files.clear().await;
    state.users.clear_owned_files().await;

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        deleted = report.deleted,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms,
        "Full cleanup completed"
    );
    report
}
