use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use std::fmt;

use super::{timestamp, User};
use crate::types::{DatabaseError, DatabaseResult};

/// A user's membership record within a workspace.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceMember {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub workspace_id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Member role enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    /// Strict parse: unknown role names are rejected rather than defaulted.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(MemberRole::Admin),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member joined with the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: WorkspaceMember,
    pub user: User,
}

impl WorkspaceMember {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, workspace_id, user_id, role, joined_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        let role: String = row.try_get("role")?;
        let role = MemberRole::parse(&role)
            .ok_or_else(|| DatabaseError::InvalidData(format!("unknown member role {role:?}")))?;

        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            workspace_id: row.try_get("workspace_id")?,
            user_id: row.try_get("user_id")?,
            role,
            joined_at: timestamp(row, "joined_at")?,
        })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, MemberRole::Admin)
    }
}

impl MemberWithUser {
    /// Decode a row selected with `m.*` columns aliased plainly and user
    /// columns prefixed with `user_`.
    pub(crate) fn from_joined_row(row: &SqliteRow) -> DatabaseResult<Self> {
        let member = WorkspaceMember::from_row(row)?;
        let user = User {
            id: row.try_get("user_id")?,
            public_id: row.try_get("user_public_id")?,
            email: row.try_get("user_email")?,
            display_name: row.try_get("user_display_name")?,
            image_url: row.try_get("user_image_url")?,
            created_at: timestamp(row, "user_created_at")?,
        };
        Ok(Self { member, user })
    }
}
