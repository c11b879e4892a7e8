use crate::error::AppError;
use crate::models::user::{Role, UserRecord};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Durable username -> user/ownership mapping, one JSON document on disk.
/// Same single-writer-lock discipline as the metadata store.
pub struct UserStore {
    path: PathBuf,
    users: Mutex<Vec<UserRecord>>,
}

pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}

impl UserStore {
    pub fn open(path: PathBuf) -> Self {
        let users: Vec<UserRecord> = super::read_json_or_default(&path);
        Self {
            path,
            users: Mutex::new(users),
        }
    }

    /// Provision the default accounts when the store is empty. Generated
    /// passwords are logged once so the operator can sign in.
    pub async fn ensure_default_users(&self) {
        let mut users = self.users.lock().await;
        if !users.is_empty() {
            return;
        }
        for (username, role) in [
            ("admin", Role::Admin),
            ("contributor", Role::Contributor),
            ("viewer", Role::Viewer),
        ] {
            let password = generate_password();
            tracing::info!(username, password = %password, "Provisioned default account");
            users.push(UserRecord {
                username: username.to_string(),
                password_digest: digest_password(&password),
                role,
                owned_files: Vec::new(),
            });
        }
        self.persist(&users);
    }

    pub async fn all(&self) -> Vec<UserRecord> {
        self.users.lock().await.clone()
    }

    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub async fn add_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), AppError> {
        let mut users = self.users.lock().await;
        if users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }
        users.push(UserRecord {
            username: username.to_string(),
            password_digest: digest_password(password),
            role,
            owned_files: Vec::new(),
        });
        self.persist(&users);
        Ok(())
    }

    /// Resolve credentials to a user record, or None if they don't match.
    pub async fn verify(&self, username: &str, password: &str) -> Option<UserRecord> {
        let digest = digest_password(password);
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username) && u.password_digest == digest)
            .cloned()
    }

    pub async fn is_file_owner(&self, username: &str, file_path: &str) -> bool {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .map(|u| u.owned_files.iter().any(|p| p == file_path))
            .unwrap_or(false)
    }

    /// Record ownership. Idempotent: a path is never listed twice.
    pub async fn add_file_to_user(&self, username: &str, file_path: &str) {
        let mut users = self.users.lock().await;
        let Some(user) = users
            .iter_mut()
            .find(|u| u.username.eq_ignore_ascii_case(username))
        else {
            return;
        };
        if user.owned_files.iter().any(|p| p == file_path) {
            return;
        }
        user.owned_files.push(file_path.to_string());
        self.persist(&users);
    }

    /// The file is gone; strip its path from every user's owned set.
    /// Safe to call for paths no one owns.
    pub async fn remove_file_from_user(&self, file_path: &str) {
        let mut users = self.users.lock().await;
        let mut changed = false;
        for user in users.iter_mut() {
            let before = user.owned_files.len();
            user.owned_files.retain(|p| p != file_path);
            changed |= user.owned_files.len() != before;
        }
        if changed {
            self.persist(&users);
        }
    }

    /// Rewrite a renamed file's path for whichever user(s) hold it.
    pub async fn update_file_path(&self, old_path: &str, new_path: &str) {
        let mut users = self.users.lock().await;
        let mut changed = false;
        for user in users.iter_mut() {
            for path in user.owned_files.iter_mut() {
                if path == old_path {
                    *path = new_path.to_string();
                    changed = true;
                }
            }
        }
        if changed {
            self.persist(&users);
        }
    }

    /// Empty every user's owned set. Part of the destructive full cleanup.
    pub async fn clear_owned_files(&self) {
        let mut users = self.users.lock().await;
        for user in users.iter_mut() {
            user.owned_files.clear();
        }
        self.persist(&users);
    }

    fn persist(&self, users: &[UserRecord]) {
        if let Err(e) = super::write_json_atomic(&self.path, &users) {
            tracing::error!(path = %self.path.display(), error = %e, "Failed to save user data");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(tmp: &tempfile::TempDir) -> UserStore {
        let store = UserStore::open(tmp.path().join("userInfo.json"));
        store
            .add_user("alice", "secret", Role::Contributor)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("userInfo.json");
        let store = UserStore::open(path.clone());
        store.add_user("alice", "secret", Role::Admin).await.unwrap();
        store.add_file_to_user("alice", "uploads/a.txt").await;

        let reloaded = UserStore::open(path);
        let user = reloaded.get("alice").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.owned_files, vec!["uploads/a.txt"]);
    }

    #[tokio::test]
    async fn verify_checks_password_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with_user(&tmp).await;
        assert!(store.verify("alice", "secret").await.is_some());
        assert!(store.verify("alice", "wrong").await.is_none());
        assert!(store.verify("bob", "secret").await.is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with_user(&tmp).await;
        let err = store.add_user("ALICE", "x", Role::Viewer).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn add_file_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with_user(&tmp).await;
        store.add_file_to_user("alice", "uploads/a.txt").await;
        store.add_file_to_user("alice", "uploads/a.txt").await;
        assert_eq!(store.get("alice").await.unwrap().owned_files.len(), 1);
    }

    #[tokio::test]
    async fn remove_file_strips_all_users_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with_user(&tmp).await;
        store.add_user("bob", "pw", Role::Contributor).await.unwrap();
        store.add_file_to_user("alice", "uploads/shared.txt").await;
        store.add_file_to_user("bob", "uploads/shared.txt").await;

        store.remove_file_from_user("uploads/shared.txt").await;
        store.remove_file_from_user("uploads/shared.txt").await;

        assert!(store.get("alice").await.unwrap().owned_files.is_empty());
        assert!(store.get("bob").await.unwrap().owned_files.is_empty());
    }

    #[tokio::test]
    async fn update_file_path_rewrites_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with_user(&tmp).await;
        store.add_file_to_user("alice", "uploads/old.txt").await;

        store
            .update_file_path("uploads/old.txt", "uploads/new.txt")
            .await;

        assert!(store.is_file_owner("alice", "uploads/new.txt").await);
        assert!(!store.is_file_owner("alice", "uploads/old.txt").await);
    }

    #[tokio::test]
    async fn default_users_provisioned_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("userInfo.json");
        let store = UserStore::open(path.clone());
        store.ensure_default_users().await;
        assert_eq!(store.all().await.len(), 3);

        let reloaded = UserStore::open(path);
        reloaded.ensure_default_users().await;
        assert_eq!(reloaded.all().await.len(), 3);
        assert_eq!(reloaded.get("admin").await.unwrap().role, Role::Admin);
    }
}
