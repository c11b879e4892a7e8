use crate::jobs::cleanup;
use crate::models::job::JobKind;
use crate::state::AppState;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;

/// Pull due jobs from the durable queue and execute them. Per-job failures
/// never stop the loop; the job boundary is where errors end.
pub async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let poll = Duration::from_secs(state.config.job_poll_interval_secs.max(1));

    loop {
        tokio::select! {
            _ = tokio::time::sleep(poll) => {}
            _ = shutdown.changed() => {
                tracing::info!("Job runner shutting down");
                return;
            }
        }

        for job in state.jobs.due(Utc::now()) {
            tracing::debug!(job_id = %job.id, kind = ?job.kind, "Executing scheduled job");
            match &job.kind {
                // A fired deadline sweeps every past-due record, so a job
                // carrying a stale (renamed or deleted) name still
                // converges to the right outcome.
                JobKind::ExpireFile { .. } | JobKind::PurgeExpired => {
                    cleanup::purge_expired(&state).await;
                }
                JobKind::PurgeAll => {
                    cleanup::purge_all(&state).await;
                }
            }
            state.jobs.complete(job.id).await;
        }
    }
}

/// Recurring safety net: sweep expired records on a fixed interval even if
/// no one-shot registration fires (e.g. the schedule was lost to a corrupt
/// document).
pub async fn sweep(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let interval = Duration::from_secs(state.config.expiry_sweep_interval_secs);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                tracing::info!("Expiry sweeper shutting down");
                return;
            }
        }

        let report = cleanup::purge_expired(&state).await;
        if report.deleted > 0 {
            tracing::info!(count = report.deleted, "Expiry sweep removed files");
        }
    }
}
