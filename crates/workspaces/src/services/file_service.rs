//! Attachment uploads and downloads.

use bytes::Bytes;
use huddle_database::{FileRepository, NewStoredFile, StoredFile, User};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::storage::FileStore;
use crate::types::{AttachmentView, WorkspaceError, WorkspaceResult};
use crate::utils::Validator;

/// Public download link for a blob.
pub fn file_url(public_url: &str, storage_id: &str) -> String {
    format!("{}/api/files/{storage_id}", public_url.trim_end_matches('/'))
}

#[derive(Clone)]
pub struct FileService {
    files: FileRepository,
    store: FileStore,
    public_url: String,
}

impl FileService {
    pub fn new(pool: SqlitePool, store: FileStore, public_url: impl Into<String>) -> Self {
        Self {
            files: FileRepository::new(pool),
            store,
            public_url: public_url.into(),
        }
    }

    /// Validate and store an upload. The returned id is what messages
    /// reference in their `files` list.
    pub async fn upload(
        &self,
        user: &User,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> WorkspaceResult<AttachmentView> {
        let size = data.len() as u64;
        let kind = Validator::file(file_name, content_type, size)?;

        let storage_id = self.store.put(&data).await?;

        let record = NewStoredFile {
            storage_id: storage_id.clone(),
            uploaded_by: user.id,
            file_name: file_name.trim().to_string(),
            content_type: Validator::stored_content_type(file_name, content_type).to_string(),
            kind,
            byte_size: data.len() as i64,
        };

        let stored = match self.files.create(record).await {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&storage_id).await {
                    warn!(storage_id = %storage_id, error = %cleanup, "failed to remove orphaned blob");
                }
                return Err(err.into());
            }
        };

        info!(
            storage_id = %storage_id,
            user_id = %user.public_id,
            kind = kind.as_str(),
            bytes = size,
            "file uploaded"
        );
        Ok(AttachmentView::new(&stored, self.url_for(&stored.storage_id)))
    }

    /// Fetch metadata and bytes. Anyone holding the storage id may download.
    pub async fn download(&self, storage_id: &str) -> WorkspaceResult<(StoredFile, Bytes)> {
        let file = self
            .files
            .find_by_storage_id(storage_id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("File"))?;
        let data = self.store.get(&file.storage_id).await?;
        Ok((file, data))
    }

    pub fn url_for(&self, storage_id: &str) -> String {
        file_url(&self.public_url, storage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        assert_eq!(
            file_url("http://localhost:7070/", "abc"),
            "http://localhost:7070/api/files/abc"
        );
        assert_eq!(
            file_url("https://chat.example.com", "abc"),
            "https://chat.example.com/api/files/abc"
        );
    }
}
