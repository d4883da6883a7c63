//! Repository for member data access operations.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::{new_public_id, now, MemberRole, MemberWithUser, WorkspaceMember};
use crate::types::DatabaseResult;

const JOINED_COLUMNS: &str = "m.id, m.public_id, m.workspace_id, m.user_id, m.role, m.joined_at,
     u.public_id AS user_public_id, u.email AS user_email, u.display_name AS user_display_name,
     u.image_url AS user_image_url, u.created_at AS user_created_at";

/// Repository for member database operations
#[derive(Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<WorkspaceMember>> {
        let query = format!(
            "SELECT {} FROM workspace_members WHERE id = ?",
            WorkspaceMember::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(WorkspaceMember::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<WorkspaceMember>> {
        let query = format!(
            "SELECT {} FROM workspace_members WHERE public_id = ?",
            WorkspaceMember::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(WorkspaceMember::from_row).transpose()
    }

    /// The membership of `user_id` in `workspace_id`, if any.
    pub async fn find_by_workspace_and_user(
        &self,
        workspace_id: i64,
        user_id: i64,
    ) -> DatabaseResult<Option<WorkspaceMember>> {
        let query = format!(
            "SELECT {} FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
            WorkspaceMember::COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(workspace_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(WorkspaceMember::from_row).transpose()
    }

    /// Member joined with its user. Returns `None` when either row is gone.
    pub async fn find_with_user(&self, id: i64) -> DatabaseResult<Option<MemberWithUser>> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM workspace_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.id = ?"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(MemberWithUser::from_joined_row).transpose()
    }

    /// All members of a workspace with their users, in join order.
    pub async fn list_with_users(&self, workspace_id: i64) -> DatabaseResult<Vec<MemberWithUser>> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM workspace_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.workspace_id = ?
             ORDER BY m.id ASC"
        );
        let rows = sqlx::query(&query)
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(MemberWithUser::from_joined_row).collect()
    }

    pub async fn count_for_workspace(&self, workspace_id: i64) -> DatabaseResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workspace_members WHERE workspace_id = ?")
                .bind(workspace_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn create(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> DatabaseResult<WorkspaceMember> {
        let (joined_at, stamp) = now();
        let public_id = new_public_id();

        let id = sqlx::query(
            "INSERT INTO workspace_members (public_id, workspace_id, user_id, role, joined_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(workspace_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(&stamp)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        info!(
            member_id = %public_id,
            workspace_id,
            user_id,
            role = %role,
            "added member to workspace"
        );

        Ok(WorkspaceMember {
            id,
            public_id,
            workspace_id,
            user_id,
            role,
            joined_at,
        })
    }

    pub async fn update_role(&self, id: i64, role: MemberRole) -> DatabaseResult<()> {
        sqlx::query("UPDATE workspace_members SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(member_id = id, role = %role, "updated member role");
        Ok(())
    }

    /// Remove a member together with their messages, reactions and
    /// conversations.
    pub async fn remove_with_content(&self, id: i64) -> DatabaseResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reactions WHERE member_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM messages WHERE member_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE member_one_id = ? OR member_two_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM workspace_members WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(member_id = id, "removed member and their content");
        Ok(())
    }
}
