use crate::models::job::{JobKind, ScheduledJob};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Durable store of deferred work. Registrations are persisted on every
/// change and reloaded at startup, so a restart never loses a planned
/// expiration or an enqueued cleanup.
pub struct JobQueue {
    path: PathBuf,
    jobs: DashMap<Uuid, ScheduledJob>,
    persist_lock: Mutex<()>,
}

impl JobQueue {
    pub fn open(path: PathBuf) -> Self {
        let jobs = DashMap::new();
        for job in load_jobs(&path) {
            jobs.insert(job.id, job);
        }
        Self {
            path,
            jobs,
            persist_lock: Mutex::new(()),
        }
    }

    /// Register a deferred action for `run_at`.
    pub async fn schedule(&self, kind: JobKind, run_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        let job = ScheduledJob {
            id,
            kind,
            run_at,
            created_at: Utc::now(),
        };
        self.jobs.insert(id, job);
        self.persist().await;
        id
    }

    /// Enqueue for the runner's next pass.
    pub async fn enqueue_now(&self, kind: JobKind) -> Uuid {
        self.schedule(kind, Utc::now()).await
    }

    /// Drop any expiry registration for a file that no longer needs one.
    pub async fn deregister_file(&self, file_name: &str) {
        let stale: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|entry| {
                matches!(&entry.value().kind, JobKind::ExpireFile { file_name: name } if name == file_name)
            })
            .map(|entry| *entry.key())
            .collect();
        if stale.is_empty() {
            return;
        }
        for id in stale {
            self.jobs.remove(&id);
        }
        self.persist().await;
    }

    pub fn due(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        self.jobs
            .iter()
            .filter(|entry| entry.value().run_at <= now)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub async fn complete(&self, id: Uuid) {
        if self.jobs.remove(&id).is_some() {
            self.persist().await;
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let jobs: Vec<ScheduledJob> = self.jobs.iter().map(|e| e.value().clone()).collect();
        if let Err(e) = save_jobs(&self.path, &jobs) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save job schedule");
        }
    }
}

fn save_jobs(path: &PathBuf, jobs: &[ScheduledJob]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("bin.tmp");
    let data = bincode::serialize(jobs)?;
    std::fs::write(&tmp_path, &data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn load_jobs(path: &PathBuf) -> Vec<ScheduledJob> {
    if !path.exists() {
        return Vec::new();
    }
    match std::fs::read(path) {
        Ok(data) => match bincode::deserialize(&data) {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt job schedule, starting empty");
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Unreadable job schedule, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn schedule_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("jobs.bin");

        let queue = JobQueue::open(path.clone());
        queue
            .schedule(
                JobKind::ExpireFile {
                    file_name: "a.txt".into(),
                },
                Utc::now() + Duration::hours(1),
            )
            .await;
        queue.enqueue_now(JobKind::PurgeAll).await;

        let reloaded = JobQueue::open(path);
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn due_selects_past_deadlines_only() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = JobQueue::open(tmp.path().join("jobs.bin"));
        let now = Utc::now();

        let due_id = queue
            .schedule(JobKind::PurgeExpired, now - Duration::seconds(1))
            .await;
        queue
            .schedule(JobKind::PurgeExpired, now + Duration::hours(1))
            .await;

        let due = queue.due(now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, due_id);
    }

    #[tokio::test]
    async fn deregister_removes_all_jobs_for_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = JobQueue::open(tmp.path().join("jobs.bin"));
        let at = Utc::now() + Duration::minutes(1);

        queue
            .schedule(JobKind::ExpireFile { file_name: "a.txt".into() }, at)
            .await;
        queue
            .schedule(JobKind::ExpireFile { file_name: "a.txt".into() }, at)
            .await;
        queue
            .schedule(JobKind::ExpireFile { file_name: "b.txt".into() }, at)
            .await;

        queue.deregister_file("a.txt").await;
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn complete_drops_the_job() {
        let tmp = tempfile::tempdir().unwrap();
        let queue = JobQueue::open(tmp.path().join("jobs.bin"));
        let id = queue.enqueue_now(JobKind::PurgeAll).await;
        queue.complete(id).await;
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn corrupt_schedule_loads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("jobs.bin");
        std::fs::write(&path, b"\xff\xff\xff").unwrap();
        assert!(JobQueue::open(path).is_empty());
    }
}
