//! Membership reads and administration.

use huddle_database::{MemberRepository, MemberRole, User, WorkspaceMember};
use sqlx::SqlitePool;
use tracing::info;

use super::access::Access;
use crate::hub::EventHub;
use crate::types::{EventEnvelope, MemberView, WorkspaceError, WorkspaceEvent, WorkspaceResult};
use crate::utils::PermissionChecker;

#[derive(Clone)]
pub struct MemberService {
    access: Access,
    members: MemberRepository,
    hub: EventHub,
}

impl MemberService {
    pub fn new(pool: SqlitePool, hub: EventHub) -> Self {
        Self {
            access: Access::new(pool.clone()),
            members: MemberRepository::new(pool),
            hub,
        }
    }

    /// The caller's own membership, or `None` when they are not in the
    /// workspace.
    pub async fn current(&self, user: &User, workspace_id: &str) -> WorkspaceResult<Option<MemberView>> {
        let workspace = self.access.workspace(workspace_id).await?;
        let Some(member) = self.access.membership(workspace.id, user).await? else {
            return Ok(None);
        };
        Ok(self
            .members
            .find_with_user(member.id)
            .await?
            .as_ref()
            .map(MemberView::from))
    }

    pub async fn list(&self, user: &User, workspace_id: &str) -> WorkspaceResult<Vec<MemberView>> {
        let (workspace, _) = self.access.enter(workspace_id, user).await?;
        let members = self.members.list_with_users(workspace.id).await?;
        Ok(members.iter().map(MemberView::from).collect())
    }

    pub async fn get_by_id(
        &self,
        user: &User,
        workspace_id: &str,
        member_id: &str,
    ) -> WorkspaceResult<MemberView> {
        let (workspace, _) = self.access.enter(workspace_id, user).await?;
        let target = self.target(member_id).await?;
        if target.workspace_id != workspace.id {
            return Err(WorkspaceError::not_found("Member"));
        }
        self.view(&target).await
    }

    pub async fn update_role(
        &self,
        user: &User,
        member_id: &str,
        role: MemberRole,
    ) -> WorkspaceResult<MemberView> {
        let target = self.target(member_id).await?;
        let workspace = self.access.workspace_by_id(target.workspace_id).await?;
        self.access.admin_of(workspace.id, user).await?;

        self.members.update_role(target.id, role).await?;

        info!(
            workspace_id = %workspace.public_id,
            member_id = %target.public_id,
            role = %role,
            "member role updated"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::MemberUpdated {
                    member_id: target.public_id.clone(),
                    role: role.to_string(),
                },
            ))
            .await;

        let updated = WorkspaceMember { role, ..target };
        self.view(&updated).await
    }

    /// Remove a member together with their messages, reactions and
    /// conversations.
    pub async fn remove(&self, user: &User, member_id: &str) -> WorkspaceResult<()> {
        let target = self.target(member_id).await?;
        let workspace = self.access.workspace_by_id(target.workspace_id).await?;
        let requester = self.access.member_of(workspace.id, user).await?;

        PermissionChecker::can_remove_member(&requester, &target)?;

        self.members.remove_with_content(target.id).await?;

        info!(
            workspace_id = %workspace.public_id,
            member_id = %target.public_id,
            removed_by = %requester.public_id,
            "member removed"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::MemberRemoved {
                    member_id: target.public_id,
                },
            ))
            .await;

        Ok(())
    }

    async fn target(&self, member_id: &str) -> WorkspaceResult<WorkspaceMember> {
        self.members
            .find_by_public_id(member_id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Member"))
    }

    async fn view(&self, member: &WorkspaceMember) -> WorkspaceResult<MemberView> {
        self.members
            .find_with_user(member.id)
            .await?
            .as_ref()
            .map(MemberView::from)
            .ok_or_else(|| WorkspaceError::not_found("Member"))
    }
}
