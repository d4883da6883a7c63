use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::DatabaseResult;

/// Named sub-space within a workspace.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub workspace_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, workspace_id, name, description, created_at, updated_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            workspace_id: row.try_get("workspace_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}
