use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A stored file. `file_name` is the authoritative identity: it is both the
/// metadata key and the literal on-disk name, so uploading the same name
/// again overwrites bytes and record alike (last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    pub file_path: String,
    pub upload_time: DateTime<Utc>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub file_size: u64,
    pub owner: Option<String>,
}

impl FileRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time.map(|exp| exp <= now).unwrap_or(false)
    }
}

/// Retention choices offered at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryOption {
    #[default]
    Never,
    OneMinute,
    OneHour,
    OneDay,
    OneWeek,
}

impl ExpiryOption {
    /// Explicit option-to-duration table. `Never` has no deadline.
    pub fn duration(self) -> Option<Duration> {
        match self {
            ExpiryOption::Never => None,
            ExpiryOption::OneMinute => Some(Duration::minutes(1)),
            ExpiryOption::OneHour => Some(Duration::hours(1)),
            ExpiryOption::OneDay => Some(Duration::days(1)),
            ExpiryOption::OneWeek => Some(Duration::weeks(1)),
        }
    }

    pub fn deadline_from(self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.duration().map(|d| start + d)
    }
}

impl std::str::FromStr for ExpiryOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(ExpiryOption::Never),
            "one_minute" | "1m" => Ok(ExpiryOption::OneMinute),
            "one_hour" | "1h" => Ok(ExpiryOption::OneHour),
            "one_day" | "1d" => Ok(ExpiryOption::OneDay),
            "one_week" | "1w" => Ok(ExpiryOption::OneWeek),
            other => Err(format!("Unknown expiry option: {}", other)),
        }
    }
}

/// Listing view of a record, with the URI a client downloads it from.
#[derive(Debug, Clone, Serialize)]
pub struct FileView {
    pub file_name: String,
    pub upload_time: DateTime<Utc>,
    pub expiry_time: Option<DateTime<Utc>>,
    pub file_size: u64,
    pub owner: Option<String>,
    pub download_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    pub sort: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CopyFileRequest {
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct BundleRequest {
    pub file_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_table_maps_each_option() {
        assert_eq!(ExpiryOption::Never.duration(), None);
        assert_eq!(
            ExpiryOption::OneMinute.duration(),
            Some(Duration::minutes(1))
        );
        assert_eq!(ExpiryOption::OneHour.duration(), Some(Duration::hours(1)));
        assert_eq!(ExpiryOption::OneDay.duration(), Some(Duration::days(1)));
        assert_eq!(ExpiryOption::OneWeek.duration(), Some(Duration::weeks(1)));
    }

    #[test]
    fn expiry_parses_from_form_values() {
        assert_eq!("never".parse(), Ok(ExpiryOption::Never));
        assert_eq!("one_hour".parse(), Ok(ExpiryOption::OneHour));
        assert_eq!("1w".parse(), Ok(ExpiryOption::OneWeek));
        assert!("fortnight".parse::<ExpiryOption>().is_err());
    }

    #[test]
    fn expired_iff_deadline_passed() {
        let now = Utc::now();
        let mut record = FileRecord {
            file_name: "a.txt".into(),
            file_path: "uploads/a.txt".into(),
            upload_time: now,
            expiry_time: Some(now - Duration::seconds(1)),
            file_size: 1,
            owner: None,
        };
        assert!(record.is_expired(now));

        record.expiry_time = Some(now + Duration::hours(1));
        assert!(!record.is_expired(now));

        record.expiry_time = None;
        assert!(!record.is_expired(now));
    }
}
