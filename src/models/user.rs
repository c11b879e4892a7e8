use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Full access, including cleanup triggers and other users' files.
    Admin,
    /// Can upload and manage their own files.
    Contributor,
    /// Read-only: list and download.
    Viewer,
}

impl Role {
    pub fn can_write(self) -> bool {
        !matches!(self, Role::Viewer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password_digest: String,
    pub role: Role,
    #[serde(default)]
    pub owned_files: Vec<String>,
}

/// Authenticated caller, resolved by the auth layer and handed to every
/// mutating operation.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}
