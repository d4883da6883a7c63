//! Lookups every service starts with: resolve a public id, then prove the
//! caller belongs to the workspace.

use huddle_database::{
    MemberRepository, User, Workspace, WorkspaceMember, WorkspaceRepository,
};
use sqlx::SqlitePool;
use tracing::debug;

use crate::types::{WorkspaceError, WorkspaceResult};
use crate::utils::PermissionChecker;

#[derive(Clone)]
pub struct Access {
    workspaces: WorkspaceRepository,
    members: MemberRepository,
}

impl Access {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            workspaces: WorkspaceRepository::new(pool.clone()),
            members: MemberRepository::new(pool),
        }
    }

    pub async fn workspace(&self, public_id: &str) -> WorkspaceResult<Workspace> {
        self.workspaces
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Workspace"))
    }

    pub async fn workspace_by_id(&self, id: i64) -> WorkspaceResult<Workspace> {
        self.workspaces
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Workspace"))
    }

    /// The caller's membership, if any.
    pub async fn membership(
        &self,
        workspace_id: i64,
        user: &User,
    ) -> WorkspaceResult<Option<WorkspaceMember>> {
        let member = self
            .members
            .find_by_workspace_and_user(workspace_id, user.id)
            .await?;
        if member.is_none() {
            debug!(workspace_id, user_id = %user.public_id, "caller is not a member");
        }
        Ok(member)
    }

    pub async fn member_of(
        &self,
        workspace_id: i64,
        user: &User,
    ) -> WorkspaceResult<WorkspaceMember> {
        PermissionChecker::require_member(self.membership(workspace_id, user).await?)
    }

    pub async fn admin_of(&self, workspace_id: i64, user: &User) -> WorkspaceResult<WorkspaceMember> {
        let member = self.member_of(workspace_id, user).await?;
        PermissionChecker::require_admin(&member)?;
        Ok(member)
    }

    /// Resolve a workspace by public id and require the caller to be in it.
    pub async fn enter(
        &self,
        workspace_id: &str,
        user: &User,
    ) -> WorkspaceResult<(Workspace, WorkspaceMember)> {
        let workspace = self.workspace(workspace_id).await?;
        let member = self.member_of(workspace.id, user).await?;
        Ok((workspace, member))
    }

    pub async fn enter_as_admin(
        &self,
        workspace_id: &str,
        user: &User,
    ) -> WorkspaceResult<(Workspace, WorkspaceMember)> {
        let (workspace, member) = self.enter(workspace_id, user).await?;
        PermissionChecker::require_admin(&member)?;
        Ok((workspace, member))
    }
}
