//! Repository for workspace data access operations.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{new_public_id, now, MemberRole, Workspace, WorkspaceMember};
use crate::types::DatabaseResult;

/// Repository for workspace database operations
#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: SqlitePool,
}

impl WorkspaceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a workspace, its first admin member and a default channel in
    /// one transaction.
    pub async fn create_with_owner(
        &self,
        name: &str,
        join_code: &str,
        owner_user_id: i64,
        default_channel: &str,
    ) -> DatabaseResult<(Workspace, WorkspaceMember)> {
        let (created_at, stamp) = now();
        let workspace_public_id = new_public_id();
        let member_public_id = new_public_id();

        let mut tx = self.pool.begin().await?;

        let workspace_id = sqlx::query(
            "INSERT INTO workspaces (public_id, name, image_url, join_code, created_by, created_at, updated_at)
             VALUES (?, ?, NULL, ?, ?, ?, ?)",
        )
        .bind(&workspace_public_id)
        .bind(name)
        .bind(join_code)
        .bind(owner_user_id)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let member_id = sqlx::query(
            "INSERT INTO workspace_members (public_id, workspace_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&member_public_id)
        .bind(workspace_id)
        .bind(owner_user_id)
        .bind(MemberRole::Admin.as_str())
        .bind(&stamp)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query(
            "INSERT INTO channels (public_id, workspace_id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, NULL, ?, ?)",
        )
        .bind(new_public_id())
        .bind(workspace_id)
        .bind(default_channel)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            workspace_id = %workspace_public_id,
            owner_user_id,
            "created workspace"
        );

        let workspace = Workspace {
            id: workspace_id,
            public_id: workspace_public_id,
            name: name.to_string(),
            image_url: None,
            join_code: join_code.to_string(),
            created_by: owner_user_id,
            created_at,
            updated_at: created_at,
        };
        let member = WorkspaceMember {
            id: member_id,
            public_id: member_public_id,
            workspace_id,
            user_id: owner_user_id,
            role: MemberRole::Admin,
            joined_at: created_at,
        };

        Ok((workspace, member))
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Workspace>> {
        let query = format!("SELECT {} FROM workspaces WHERE id = ?", Workspace::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Workspace::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<Workspace>> {
        let query = format!(
            "SELECT {} FROM workspaces WHERE public_id = ?",
            Workspace::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Workspace::from_row).transpose()
    }

    /// Workspaces the user belongs to, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Workspace>> {
        let rows = sqlx::query(
            "SELECT w.id, w.public_id, w.name, w.image_url, w.join_code, w.created_by, w.created_at, w.updated_at
             FROM workspaces w
             JOIN workspace_members m ON m.workspace_id = w.id
             WHERE m.user_id = ?
             ORDER BY w.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Workspace::from_row).collect()
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Workspace>> {
        let query = format!("SELECT {} FROM workspaces ORDER BY id ASC", Workspace::COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(Workspace::from_row).collect()
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        image_url: Option<&str>,
    ) -> DatabaseResult<()> {
        let (_, stamp) = now();
        sqlx::query("UPDATE workspaces SET name = ?, image_url = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(image_url)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_join_code(&self, id: i64, join_code: &str) -> DatabaseResult<()> {
        let (_, stamp) = now();
        sqlx::query("UPDATE workspaces SET join_code = ?, updated_at = ? WHERE id = ?")
            .bind(join_code)
            .bind(&stamp)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a workspace and everything scoped to it.
    pub async fn delete(&self, id: i64) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        for statement in [
            "DELETE FROM reactions WHERE workspace_id = ?",
            "DELETE FROM message_files WHERE message_id IN (SELECT id FROM messages WHERE workspace_id = ?)",
            "DELETE FROM messages WHERE workspace_id = ?",
            "DELETE FROM conversations WHERE workspace_id = ?",
            "DELETE FROM channels WHERE workspace_id = ?",
            "DELETE FROM workspace_members WHERE workspace_id = ?",
            "DELETE FROM workspaces WHERE id = ?",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!(workspace_id = id, "deleted workspace");
        Ok(())
    }
}
