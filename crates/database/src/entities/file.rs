use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::{DatabaseError, DatabaseResult};

/// Metadata for an uploaded blob. The bytes live in file storage under
/// `storage_id`.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    #[serde(skip_serializing)]
    pub id: i64,
    pub storage_id: String,
    #[serde(skip_serializing)]
    pub uploaded_by: i64,
    pub file_name: String,
    pub content_type: String,
    pub kind: FileKind,
    pub byte_size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub storage_id: String,
    pub uploaded_by: i64,
    pub file_name: String,
    pub content_type: String,
    pub kind: FileKind,
    pub byte_size: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Document,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Document => "document",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(FileKind::Image),
            "document" => Some(FileKind::Document),
            _ => None,
        }
    }
}

impl StoredFile {
    pub(crate) const COLUMNS: &'static str =
        "id, storage_id, uploaded_by, file_name, content_type, kind, byte_size, created_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        let kind: String = row.try_get("kind")?;
        let kind = FileKind::parse(&kind)
            .ok_or_else(|| DatabaseError::InvalidData(format!("unknown file kind {kind:?}")))?;

        Ok(Self {
            id: row.try_get("id")?,
            storage_id: row.try_get("storage_id")?,
            uploaded_by: row.try_get("uploaded_by")?,
            file_name: row.try_get("file_name")?,
            content_type: row.try_get("content_type")?,
            kind,
            byte_size: row.try_get("byte_size")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}
