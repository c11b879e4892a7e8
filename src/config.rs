use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub uploads_dir: String,
    pub max_disk_space_gb: u64,
    pub max_file_size_mb: u64,
    pub warning_threshold_percent: u64,
    pub critical_threshold_percent: u64,
    pub expiry_sweep_interval_secs: u64,
    pub job_poll_interval_secs: u64,
    pub log_level: String,
    pub cors_allowed_origins: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "app-data".into()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
            max_disk_space_gb: parse_env("MAX_DISK_SPACE_GB", 100),
            max_file_size_mb: parse_env("MAX_FILE_SIZE_MB", 100),
            warning_threshold_percent: parse_env("WARNING_THRESHOLD_PERCENT", 90),
            critical_threshold_percent: parse_env("CRITICAL_THRESHOLD_PERCENT", 99),
            expiry_sweep_interval_secs: parse_env("EXPIRY_SWEEP_INTERVAL_SECS", 60),
            job_poll_interval_secs: parse_env("JOB_POLL_INTERVAL_SECS", 1),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".into()),
        }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.uploads_dir)
    }

    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("fileInfo.json")
    }

    pub fn users_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("userInfo.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("apiMetrics.json")
    }

    pub fn jobs_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("jobs.bin")
    }

    /// Soft quota ceiling for the uploads directory, in bytes.
    /// This is the configured allocation, not the physical device size.
    pub fn max_disk_space_bytes(&self) -> u64 {
        self.max_disk_space_gb * 1024 * 1024 * 1024
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
