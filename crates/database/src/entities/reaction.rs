use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::DatabaseResult;

/// One member's emoji on one message.
#[derive(Debug, Clone, Serialize)]
pub struct Reaction {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub workspace_id: i64,
    #[serde(skip_serializing)]
    pub message_id: i64,
    #[serde(skip_serializing)]
    pub member_id: i64,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, workspace_id, message_id, member_id, emoji, created_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            workspace_id: row.try_get("workspace_id")?,
            message_id: row.try_get("message_id")?,
            member_id: row.try_get("member_id")?,
            emoji: row.try_get("emoji")?,
            created_at: timestamp(row, "created_at")?,
        })
    }
}
