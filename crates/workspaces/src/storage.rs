//! Blob storage for uploaded files.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::types::{WorkspaceError, WorkspaceResult};

/// Stores each blob as a single file named by its storage id.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a blob under a fresh storage id.
    pub async fn put(&self, data: &[u8]) -> WorkspaceResult<String> {
        fs::create_dir_all(&self.root).await?;

        let storage_id = Uuid::new_v4().to_string();
        fs::write(self.root.join(&storage_id), data).await?;

        debug!(storage_id = %storage_id, bytes = data.len(), "stored blob");
        Ok(storage_id)
    }

    pub async fn get(&self, storage_id: &str) -> WorkspaceResult<Bytes> {
        let path = self.path_for(storage_id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(WorkspaceError::not_found("File"))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, storage_id: &str) -> WorkspaceResult<()> {
        let path = self.path_for(storage_id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Only canonical UUIDs map to paths, so ids can never escape the root.
    fn path_for(&self, storage_id: &str) -> WorkspaceResult<PathBuf> {
        let id = Uuid::parse_str(storage_id).map_err(|_| WorkspaceError::not_found("File"))?;
        Ok(self.root.join(id.to_string()))
    }
}
