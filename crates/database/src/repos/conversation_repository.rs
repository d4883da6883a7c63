use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{new_public_id, now, Conversation};
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the conversation between two members regardless of who opened it.
    pub async fn find_between(
        &self,
        workspace_id: i64,
        member_a: i64,
        member_b: i64,
    ) -> DatabaseResult<Option<Conversation>> {
        let (low, high) = Conversation::ordered(member_a, member_b);
        let query = format!(
            "SELECT {} FROM conversations
             WHERE workspace_id = ? AND member_one_id = ? AND member_two_id = ?",
            Conversation::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(workspace_id)
            .bind(low)
            .bind(high)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Conversation::from_row).transpose()
    }

    /// Insert a pairing. Fails with a unique violation when the pair
    /// already has a conversation in this workspace.
    pub async fn create(
        &self,
        workspace_id: i64,
        member_a: i64,
        member_b: i64,
    ) -> DatabaseResult<Conversation> {
        let (member_one_id, member_two_id) = Conversation::ordered(member_a, member_b);
        let (created_at, stamp) = now();
        let public_id = new_public_id();

        let id = sqlx::query(
            "INSERT INTO conversations (public_id, workspace_id, member_one_id, member_two_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(workspace_id)
        .bind(member_one_id)
        .bind(member_two_id)
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(conversation_id = %public_id, workspace_id, "created conversation");

        Ok(Conversation {
            id,
            public_id,
            workspace_id,
            member_one_id,
            member_two_id,
            created_at,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Conversation>> {
        let query = format!("SELECT {} FROM conversations WHERE id = ?", Conversation::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Conversation::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Conversation>> {
        let query = format!(
            "SELECT {} FROM conversations WHERE public_id = ?",
            Conversation::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Conversation::from_row).transpose()
    }

    /// Conversations a member takes part in, newest first.
    pub async fn list_for_member(
        &self,
        workspace_id: i64,
        member_id: i64,
    ) -> DatabaseResult<Vec<Conversation>> {
        let query = format!(
            "SELECT {} FROM conversations
             WHERE workspace_id = ? AND (member_one_id = ? OR member_two_id = ?)
             ORDER BY id DESC",
            Conversation::COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(workspace_id)
            .bind(member_id)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Conversation::from_row).collect()
    }
}
