use crate::models::file::FileRecord;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Durable file-name -> record mapping, one JSON document on disk.
///
/// Every mutation is a load-mutate-save cycle serialized by a single lock:
/// the in-memory list is the loaded state, and the save happens before the
/// guard drops, so two concurrent writers can never lose an update.
pub struct MetadataStore {
    path: PathBuf,
    records: Mutex<Vec<FileRecord>>,
}

impl MetadataStore {
    pub fn open(path: PathBuf) -> Self {
        let records: Vec<FileRecord> = super::read_json_or_default(&path);
        Self {
            path,
            records: Mutex::new(records),
        }
    }

    pub async fn list(&self) -> Vec<FileRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn get(&self, file_name: &str) -> Option<FileRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.file_name == file_name)
            .cloned()
    }

    pub async fn contains(&self, file_name: &str) -> bool {
        self.records
            .lock()
            .await
            .iter()
            .any(|r| r.file_name == file_name)
    }

    /// Insert a record. An existing record under the same name is replaced:
    /// colliding uploads overwrite both bytes and metadata.
    pub async fn insert(&self, record: FileRecord) {
        let mut records = self.records.lock().await;
        records.retain(|r| r.file_name != record.file_name);
        records.push(record);
        self.persist(&records);
    }

    pub async fn remove(&self, file_name: &str) -> Option<FileRecord> {
        let mut records = self.records.lock().await;
        let pos = records.iter().position(|r| r.file_name == file_name)?;
        let removed = records.remove(pos);
        self.persist(&records);
        Some(removed)
    }

    /// Rewrite a record's name and path in place. Returns the updated
    /// record, or None if no record holds `old_name`.
    pub async fn rename(
        &self,
        old_name: &str,
        new_name: &str,
        new_path: &str,
    ) -> Option<FileRecord> {
        let mut records = self.records.lock().await;
        let record = records.iter_mut().find(|r| r.file_name == old_name)?;
        record.file_name = new_name.to_string();
        record.file_path = new_path.to_string();
        let updated = record.clone();
        self.persist(&records);
        Some(updated)
    }

    /// Records whose expiry deadline has passed.
    pub async fn expired_before(&self, now: DateTime<Utc>) -> Vec<FileRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.is_expired(now))
            .cloned()
            .collect()
    }

    /// Write an empty document. Part of the destructive full cleanup.
    pub async fn clear(&self) {
        let mut records = self.records.lock().await;
        records.clear();
        self.persist(&records);
    }

    fn persist(&self, records: &[FileRecord]) {
        if let Err(e) = super::write_json_atomic(&self.path, &records) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save file metadata");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(name: &str) -> FileRecord {
        FileRecord {
            file_name: name.to_string(),
            file_path: format!("uploads/{}", name),
            upload_time: Utc::now(),
            expiry_time: None,
            file_size: 42,
            owner: Some("admin".into()),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fileInfo.json");

        let store = MetadataStore::open(path.clone());
        store.insert(record("a.txt")).await;
        store.insert(record("b.txt")).await;

        let reloaded = MetadataStore::open(path);
        let mut names: Vec<String> = reloaded
            .list()
            .await
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn corrupt_document_loads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fileInfo.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = MetadataStore::open(path);
        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn insert_same_name_replaces_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MetadataStore::open(tmp.path().join("fileInfo.json"));

        store.insert(record("a.txt")).await;
        let mut newer = record("a.txt");
        newer.file_size = 99;
        store.insert(newer).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("a.txt").await.unwrap().file_size, 99);
    }

    #[tokio::test]
    async fn expired_before_selects_past_deadlines_only() {
        let tmp = tempfile::tempdir().unwrap();
        let store = MetadataStore::open(tmp.path().join("fileInfo.json"));
        let now = Utc::now();

        let mut past = record("old.txt");
        past.expiry_time = Some(now - Duration::seconds(1));
        let mut future = record("new.txt");
        future.expiry_time = Some(now + Duration::hours(1));
        store.insert(past).await;
        store.insert(future).await;
        store.insert(record("keep.txt")).await;

        let expired = store.expired_before(now).await;
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].file_name, "old.txt");
    }

    #[tokio::test]
    async fn concurrent_inserts_never_lose_a_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(MetadataStore::open(tmp.path().join("fileInfo.json")));

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.insert(record("one.bin")).await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.insert(record("two.bin")).await })
        };
        a.await.unwrap();
        b.await.unwrap();

        assert_eq!(store.len().await, 2);
    }
}
