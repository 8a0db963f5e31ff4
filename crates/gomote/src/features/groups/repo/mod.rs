use async_trait::async_trait;
use gomote_core::{CoreError, Group};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("invalid group: {0}")]
    Invalid(#[from] CoreError),
    #[error("group {0:?} already exists")]
    AlreadyExists(String),
    #[error("group {0:?} does not exist")]
    NotFound(String),
    #[error("group file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("group file {path}: {message}")]
    Serialization { path: PathBuf, message: String },
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Persistence for named instance groups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Create and persist an empty group; fails if one with that name exists
    async fn create_group(&self, name: &str) -> Result<Group, GroupError>;

    /// Load an existing group
    async fn load_group(&self, name: &str) -> Result<Group, GroupError>;

    /// Overwrite the stored state of a group
    async fn store_group(&self, group: &Group) -> Result<(), GroupError>;
}

/// Keeps one pretty-printed JSON file per group under a directory.
#[derive(Debug, Clone)]
pub struct FileGroupStore {
    dir: PathBuf,
}

impl FileGroupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, GroupError> {
        Group::validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    async fn write(&self, path: &Path, group: &Group) -> Result<(), GroupError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| GroupError::Io {
                path: self.dir.clone(),
                source,
            })?;
        let body =
            serde_json::to_vec_pretty(group).map_err(|e| GroupError::Serialization {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        tokio::fs::write(path, body)
            .await
            .map_err(|source| GroupError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl GroupStore for FileGroupStore {
    async fn create_group(&self, name: &str) -> Result<Group, GroupError> {
        let path = self.path_for(name)?;
        if tokio::fs::try_exists(&path)
            .await
            .map_err(|source| GroupError::Io {
                path: path.clone(),
                source,
            })?
        {
            return Err(GroupError::AlreadyExists(name.to_string()));
        }

        let group = Group::new(name)?;
        self.write(&path, &group).await?;
        debug!(group = %name, path = %path.display(), "Created group");
        Ok(group)
    }

    async fn load_group(&self, name: &str) -> Result<Group, GroupError> {
        let path = self.path_for(name)?;
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GroupError::NotFound(name.to_string()))
            }
            Err(source) => return Err(GroupError::Io { path, source }),
        };
        serde_json::from_slice(&body).map_err(|e| GroupError::Serialization {
            path,
            message: e.to_string(),
        })
    }

    async fn store_group(&self, group: &Group) -> Result<(), GroupError> {
        let path = self.path_for(&group.name)?;
        self.write(&path, group).await?;
        debug!(group = %group.name, instances = group.len(), "Stored group");
        Ok(())
    }
}

/// In-memory implementation of the group store
#[derive(Clone, Default)]
pub struct InMemoryGroupStore {
    storage: Arc<RwLock<HashMap<String, Group>>>,
    store_calls: Arc<AtomicUsize>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Group> {
        self.storage
            .read()
            .ok()
            .and_then(|storage| storage.get(name).cloned())
    }

    /// Number of `store_group` calls seen so far
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupStore for InMemoryGroupStore {
    async fn create_group(&self, name: &str) -> Result<Group, GroupError> {
        let group = Group::new(name)?;
        let mut storage = self
            .storage
            .write()
            .map_err(|_| GroupError::StorageError("Lock poisoned".to_string()))?;
        if storage.contains_key(name) {
            return Err(GroupError::AlreadyExists(name.to_string()));
        }
        storage.insert(name.to_string(), group.clone());
        Ok(group)
    }

    async fn load_group(&self, name: &str) -> Result<Group, GroupError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| GroupError::StorageError("Lock poisoned".to_string()))?;
        storage
            .get(name)
            .cloned()
            .ok_or_else(|| GroupError::NotFound(name.to_string()))
    }

    async fn store_group(&self, group: &Group) -> Result<(), GroupError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| GroupError::StorageError("Lock poisoned".to_string()))?;
        storage.insert(group.name.clone(), group.clone());
        Ok(())
    }
}
