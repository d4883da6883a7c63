use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::DatabaseResult;

/// Top-level tenant container.
#[derive(Debug, Clone, Serialize)]
pub struct Workspace {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Code other users present to join. Only admins ever see it.
    #[serde(skip_serializing)]
    pub join_code: String,
    #[serde(skip_serializing)]
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, name, image_url, join_code, created_by, created_at, updated_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            name: row.try_get("name")?,
            image_url: row.try_get("image_url")?,
            join_code: row.try_get("join_code")?,
            created_by: row.try_get("created_by")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}
