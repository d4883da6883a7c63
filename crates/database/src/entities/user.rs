use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::timestamp;
use crate::types::DatabaseResult;

/// A person who can sign in and join workspaces.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub(crate) const COLUMNS: &'static str =
        "id, public_id, email, display_name, image_url, created_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            image_url: row.try_get("image_url")?,
            created_at: timestamp(row, "created_at")?,
        })
    }

    /// Name shown next to messages: display name, else email, else "Member".
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Member")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>, email: Option<&str>) -> User {
        User {
            id: 1,
            public_id: "u1".into(),
            email: email.map(str::to_string),
            display_name: display_name.map(str::to_string),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn name_prefers_display_name_then_email() {
        assert_eq!(user(Some("Ada"), Some("ada@example.com")).name(), "Ada");
        assert_eq!(user(None, Some("ada@example.com")).name(), "ada@example.com");
        assert_eq!(user(None, None).name(), "Member");
    }
}
