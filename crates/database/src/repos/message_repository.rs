//! Repository for message data access operations.

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::entities::{
    new_public_id, now, timestamp, Message, MessageScope, NewMessage, StoredFile,
    ThreadSummary,
};
use crate::types::DatabaseResult;

/// A page of messages, newest first.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    /// Whether the scope has no entries past this page.
    pub is_done: bool,
    /// The newest message of the following page, if any.
    pub older: Option<Message>,
}

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a message and link its files in the given order.
    pub async fn create(&self, new: NewMessage, file_ids: &[i64]) -> DatabaseResult<Message> {
        let (created_at, stamp) = now();
        let public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO messages (public_id, workspace_id, member_id, channel_id, conversation_id,
                                   parent_message_id, text, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)",
        )
        .bind(&public_id)
        .bind(new.workspace_id)
        .bind(new.member_id)
        .bind(new.channel_id)
        .bind(new.conversation_id)
        .bind(new.parent_message_id)
        .bind(new.text.as_deref())
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for (position, file_id) in file_ids.iter().enumerate() {
            sqlx::query("INSERT INTO message_files (message_id, file_id, position) VALUES (?, ?, ?)")
                .bind(id)
                .bind(file_id)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            message_id = %public_id,
            workspace_id = new.workspace_id,
            member_id = new.member_id,
            files = file_ids.len(),
            "created message"
        );

        Ok(Message {
            id,
            public_id,
            workspace_id: new.workspace_id,
            member_id: new.member_id,
            channel_id: new.channel_id,
            conversation_id: new.conversation_id,
            parent_message_id: new.parent_message_id,
            text: new.text,
            created_at,
            updated_at: None,
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Message>> {
        let query = format!("SELECT {} FROM messages WHERE id = ?", Message::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Message::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Message>> {
        let query = format!("SELECT {} FROM messages WHERE public_id = ?", Message::COLUMNS);
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Message::from_row).transpose()
    }

    /// Fetch up to `limit` messages of a scope, newest first, strictly older
    /// than the message with row id `before`.
    pub async fn list_page(
        &self,
        scope: MessageScope,
        before: Option<i64>,
        limit: u32,
    ) -> DatabaseResult<MessagePage> {
        let (filter, scope_id) = scope.filter();
        let query = format!(
            "SELECT {} FROM messages WHERE {filter} AND id < ? ORDER BY id DESC LIMIT ?",
            Message::COLUMNS
        );

        // One extra row tells us whether another page exists.
        let rows = sqlx::query(&query)
            .bind(scope_id)
            .bind(before.unwrap_or(i64::MAX))
            .bind(i64::from(limit) + 1)
            .fetch_all(&self.pool)
            .await?;

        let mut messages = rows
            .iter()
            .map(Message::from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;
        let older = if messages.len() > limit as usize {
            messages.pop()
        } else {
            None
        };
        let is_done = older.is_none();

        debug!(?scope, before, count = messages.len(), is_done, "listed message page");
        Ok(MessagePage {
            messages,
            is_done,
            older,
        })
    }

    /// Files attached to a message in attachment order.
    pub async fn attachments(&self, message_id: i64) -> DatabaseResult<Vec<StoredFile>> {
        let rows = sqlx::query(
            "SELECT f.id, f.storage_id, f.uploaded_by, f.file_name, f.content_type, f.kind,
                    f.byte_size, f.created_at
             FROM message_files mf
             JOIN stored_files f ON f.id = mf.file_id
             WHERE mf.message_id = ?
             ORDER BY mf.position ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(StoredFile::from_row).collect()
    }

    pub async fn thread_summary(&self, message_id: i64) -> DatabaseResult<ThreadSummary> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE parent_message_id = ?")
                .bind(message_id)
                .fetch_one(&self.pool)
                .await?;

        if count == 0 {
            return Ok(ThreadSummary::default());
        }

        let latest = sqlx::query(
            "SELECT member_id, created_at FROM messages
             WHERE parent_message_id = ?
             ORDER BY id DESC
             LIMIT 1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = latest else {
            return Ok(ThreadSummary::default());
        };

        Ok(ThreadSummary {
            count,
            last_reply_at: Some(timestamp(&row, "created_at")?),
            last_reply_member_id: row.try_get("member_id")?,
        })
    }

    pub async fn update_text(&self, id: i64, text: &str) -> DatabaseResult<()> {
        let (_, stamp) = now();
        sqlx::query("UPDATE messages SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(message_id = id, "updated message");
        Ok(())
    }

    /// Delete a message with its replies, reactions and file links.
    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        for statement in [
            "DELETE FROM reactions WHERE message_id IN (SELECT id FROM messages WHERE id = ? OR parent_message_id = ?)",
            "DELETE FROM message_files WHERE message_id IN (SELECT id FROM messages WHERE id = ? OR parent_message_id = ?)",
            "DELETE FROM messages WHERE parent_message_id = ? OR id = ?",
        ] {
            sqlx::query(statement)
                .bind(id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(message_id = id, "deleted message");
        Ok(())
    }

    pub async fn count_for_workspace(&self, workspace_id: i64) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE workspace_id = ?")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
