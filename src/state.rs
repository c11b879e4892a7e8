use crate::config::AppConfig;
use crate::jobs::queue::JobQueue;
use crate::store::metadata::MetadataStore;
use crate::store::metrics::MetricsStore;
use crate::store::users::UserStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub files: Arc<MetadataStore>,
    pub users: Arc<UserStore>,
    pub metrics: Arc<MetricsStore>,
    pub jobs: Arc<JobQueue>,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Open every durable store from the configured data directory. Each
    /// store degrades to empty on unreadable state rather than failing.
    pub fn new(config: AppConfig) -> Self {
        let files = Arc::new(MetadataStore::open(config.metadata_path()));
        let users = Arc::new(UserStore::open(config.users_path()));
        let metrics = Arc::new(MetricsStore::open(config.metrics_path()));
        let jobs = Arc::new(JobQueue::open(config.jobs_path()));
        Self {
            config: Arc::new(config),
            files,
            users,
            metrics,
            jobs,
            start_time: chrono::Utc::now(),
        }
    }
}
