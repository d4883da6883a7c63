use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::DatabaseResult;

/// Direct-message pairing between two members of one workspace.
///
/// The pair is unordered and stored canonically: `member_one_id` is the
/// lower member id, so one pair maps to exactly one row.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub workspace_id: i64,
    #[serde(skip_serializing)]
    pub member_one_id: i64,
    #[serde(skip_serializing)]
    pub member_two_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, workspace_id, member_one_id, member_two_id, created_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            workspace_id: row.try_get("workspace_id")?,
            member_one_id: row.try_get("member_one_id")?,
            member_two_id: row.try_get("member_two_id")?,
            created_at: timestamp(row, "created_at")?,
        })
    }

    /// Canonical storage order for a member pair.
    pub fn ordered(member_a: i64, member_b: i64) -> (i64, i64) {
        (member_a.min(member_b), member_a.max(member_b))
    }

    pub fn involves(&self, member_id: i64) -> bool {
        self.member_one_id == member_id || self.member_two_id == member_id
    }

    /// The participant that is not `member_id`. For a self-conversation
    /// both slots hold the same member.
    pub fn other_member(&self, member_id: i64) -> i64 {
        if self.member_one_id == member_id {
            self.member_two_id
        } else {
            self.member_one_id
        }
    }
}
