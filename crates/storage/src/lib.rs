#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use tl_core::TaskTree;
use tl_core::ids::{Identity, UserId};

mod cache;

pub use cache::TreeCache;

const RECORD_FILE: &str = "tasks.json";

/// A failing store is fatal to the operation that touched it: a load or
/// save error is never converted into an empty tree.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Record(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Record(err) => write!(f, "record: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Record(value)
    }
}

/// Filesystem persistence: one JSON record per identity at
/// `<data_dir>/<user_id>/<session_id>/tasks.json`.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn record_path(&self, identity: &Identity) -> PathBuf {
        self.data_dir
            .join(identity.user.as_str())
            .join(identity.session.as_str())
            .join(RECORD_FILE)
    }

    /// Loads one identity's tree. "No record yet" is a valid state and
    /// yields an empty tree; an unreadable or corrupt record is an error.
    pub fn load(&self, identity: &Identity) -> Result<TaskTree, StoreError> {
        let path = self.record_path(identity);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TaskTree::new());
            }
            Err(err) => return Err(StoreError::Io(err)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the full tree in one logical operation. The record is
    /// written to a sibling temp file and renamed into place, so a
    /// concurrent reader sees either the old record or the new one,
    /// never a partial write.
    pub fn save(&self, identity: &Identity, tree: &TaskTree) -> Result<(), StoreError> {
        let path = self.record_path(identity);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let body = serde_json::to_string_pretty(tree)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Removes one identity's durable record. Returns false when there
    /// was nothing to remove.
    pub fn delete(&self, identity: &Identity) -> Result<bool, StoreError> {
        match std::fs::remove_file(self.record_path(identity)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    /// User ids that have at least one session with a durable record,
    /// sorted for deterministic output.
    pub fn list_users(&self) -> Result<Vec<String>, StoreError> {
        let mut users = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !self.sessions_under(&entry.path())?.is_empty() {
                users.push(name);
            }
        }
        users.sort();
        Ok(users)
    }

    /// Session ids under one user that have a durable record, sorted.
    pub fn list_sessions(&self, user: &UserId) -> Result<Vec<String>, StoreError> {
        let user_dir = self.data_dir.join(user.as_str());
        if !user_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut sessions = self.sessions_under(&user_dir)?;
        sessions.sort();
        Ok(sessions)
    }

    fn sessions_under(&self, user_dir: &Path) -> Result<Vec<String>, StoreError> {
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(user_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if entry.path().join(RECORD_FILE).is_file() {
                sessions.push(name);
            }
        }
        Ok(sessions)
    }
}
