use serde::Serialize;
use std::path::Path;

/// Usage against the configured ceiling. `total` is the allocation from
/// config, never the physical device capacity.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpaceInfo {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceStatus {
    Normal,
    Warning,
    Critical,
}

impl SpaceInfo {
    pub fn used_percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.used as f64 / self.total as f64 * 100.0
    }

    pub fn status(&self, warning_percent: u64, critical_percent: u64) -> SpaceStatus {
        let used = self.used_percent();
        if used >= critical_percent as f64 {
            SpaceStatus::Critical
        } else if used >= warning_percent as f64 {
            SpaceStatus::Warning
        } else {
            SpaceStatus::Normal
        }
    }
}

/// Sum current on-disk sizes in the uploads directory. Every file is
/// re-stat'ed at call time; concurrent uploads and deletes change sizes
/// between check and use, so cached figures cannot be trusted.
pub fn disk_usage(uploads_dir: &Path, ceiling_bytes: u64) -> SpaceInfo {
    let mut used = 0u64;
    if let Ok(entries) = std::fs::read_dir(uploads_dir) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                if meta.is_file() {
                    used += meta.len();
                }
            }
        }
    }
    SpaceInfo {
        total: ceiling_bytes,
        used,
        free: ceiling_bytes.saturating_sub(used),
    }
}

/// Human-readable size in binary (1024) steps, one decimal.
pub fn format_bytes(bytes: u64) -> String {
    const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut number = bytes as f64;
    let mut counter = 0;
    while (number / 1024.0).round() >= 1.0 && counter < SUFFIXES.len() - 1 {
        number /= 1024.0;
        counter += 1;
    }
    format!("{:.1} {}", number, SUFFIXES[counter])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_uses_binary_steps() {
        assert_eq!(format_bytes(0), "0.0 B");
        assert_eq!(format_bytes(500), "500.0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn status_classification_against_thresholds() {
        let info = |used| SpaceInfo {
            total: 100,
            used,
            free: 100 - used,
        };
        assert_eq!(info(10).status(90, 99), SpaceStatus::Normal);
        assert_eq!(info(90).status(90, 99), SpaceStatus::Warning);
        assert_eq!(info(99).status(90, 99), SpaceStatus::Critical);
        assert_eq!(info(100).status(90, 99), SpaceStatus::Critical);
    }

    #[test]
    fn disk_usage_restats_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.bin"), vec![0u8; 300]).unwrap();
        std::fs::write(tmp.path().join("b.bin"), vec![0u8; 200]).unwrap();

        let info = disk_usage(tmp.path(), 1000);
        assert_eq!(info.used, 500);
        assert_eq!(info.free, 500);
        assert_eq!(info.total, 1000);

        std::fs::remove_file(tmp.path().join("a.bin")).unwrap();
        assert_eq!(disk_usage(tmp.path(), 1000).used, 200);
    }

    #[test]
    fn missing_directory_counts_as_empty() {
        let info = disk_usage(Path::new("does/not/exist"), 1000);
        assert_eq!(info.used, 0);
        assert_eq!(info.free, 1000);
    }
}
