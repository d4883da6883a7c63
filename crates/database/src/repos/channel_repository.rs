//! Repository for channel data access operations.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{new_public_id, now, Channel};
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        workspace_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> DatabaseResult<Channel> {
        let (created_at, stamp) = now();
        let public_id = new_public_id();

        let id = sqlx::query(
            "INSERT INTO channels (public_id, workspace_id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(workspace_id)
        .bind(name)
        .bind(description)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(channel_id = %public_id, workspace_id, name, "created channel");

        Ok(Channel {
            id,
            public_id,
            workspace_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at,
            updated_at: created_at,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Channel>> {
        let query = format!("SELECT {} FROM channels WHERE id = ?", Channel::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Channel::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Channel>> {
        let query = format!("SELECT {} FROM channels WHERE public_id = ?", Channel::COLUMNS);
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Channel::from_row).transpose()
    }

    /// Channels of a workspace, newest first.
    pub async fn list_by_workspace(&self, workspace_id: i64) -> DatabaseResult<Vec<Channel>> {
        let query = format!(
            "SELECT {} FROM channels WHERE workspace_id = ? ORDER BY id DESC",
            Channel::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Channel::from_row).collect()
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> DatabaseResult<()> {
        let (_, stamp) = now();
        sqlx::query("UPDATE channels SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a channel along with its messages and their reactions.
    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM reactions WHERE message_id IN (SELECT id FROM messages WHERE channel_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM messages WHERE channel_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(channel_id = id, "deleted channel");
        Ok(())
    }
}
