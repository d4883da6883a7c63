use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{new_public_id, now, Reaction};
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct ReactionRepository {
    pool: SqlitePool,
}

impl ReactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(
        &self,
        message_id: i64,
        member_id: i64,
        emoji: &str,
    ) -> DatabaseResult<Option<Reaction>> {
        let query = format!(
            "SELECT {} FROM reactions WHERE message_id = ? AND member_id = ? AND emoji = ?",
            Reaction::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(message_id)
            .bind(member_id)
            .bind(emoji)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Reaction::from_row).transpose()
    }

    pub async fn create(
        &self,
        workspace_id: i64,
        message_id: i64,
        member_id: i64,
        emoji: &str,
    ) -> DatabaseResult<Reaction> {
        let (created_at, stamp) = now();
        let public_id = new_public_id();

        let id = sqlx::query(
            "INSERT INTO reactions (public_id, workspace_id, message_id, member_id, emoji, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(workspace_id)
        .bind(message_id)
        .bind(member_id)
        .bind(emoji)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(message_id, member_id, emoji, "added reaction");

        Ok(Reaction {
            id,
            public_id,
            workspace_id,
            message_id,
            member_id,
            emoji: emoji.to_string(),
            created_at,
        })
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM reactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(reaction_id = id, "removed reaction");
        Ok(())
    }

    /// Reactions on a message in insertion order.
    pub async fn list_by_message(&self, message_id: i64) -> DatabaseResult<Vec<Reaction>> {
        let query = format!(
            "SELECT {} FROM reactions WHERE message_id = ? ORDER BY id ASC",
            Reaction::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(message_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Reaction::from_row).collect()
    }
}
