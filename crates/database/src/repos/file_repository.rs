//! Metadata for uploaded files.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{now, NewStoredFile, StoredFile};
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewStoredFile) -> DatabaseResult<StoredFile> {
        let (created_at, stamp) = now();

        let id = sqlx::query(
            "INSERT INTO stored_files (storage_id, uploaded_by, file_name, content_type, kind, byte_size, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.storage_id)
        .bind(new.uploaded_by)
        .bind(&new.file_name)
        .bind(&new.content_type)
        .bind(new.kind.as_str())
        .bind(new.byte_size)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(
            storage_id = %new.storage_id,
            kind = new.kind.as_str(),
            bytes = new.byte_size,
            "stored file metadata"
        );

        Ok(StoredFile {
            id,
            storage_id: new.storage_id,
            uploaded_by: new.uploaded_by,
            file_name: new.file_name,
            content_type: new.content_type,
            kind: new.kind,
            byte_size: new.byte_size,
            created_at,
        })
    }

    pub async fn find_by_storage_id(&self, storage_id: &str) -> DatabaseResult<Option<StoredFile>> {
        let query = format!(
            "SELECT {} FROM stored_files WHERE storage_id = ?",
            StoredFile::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(storage_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(StoredFile::from_row).transpose()
    }
}
