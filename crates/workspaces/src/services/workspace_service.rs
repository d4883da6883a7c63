//! Workspace lifecycle: create, browse, join, administer.

use huddle_database::{MemberRepository, MemberRole, User, WorkspaceRepository};
use sqlx::SqlitePool;
use tracing::info;

use super::access::Access;
use crate::hub::EventHub;
use crate::types::{
    EventEnvelope, MemberView, WorkspaceError, WorkspaceEvent, WorkspaceInfo, WorkspaceResult,
    WorkspaceView,
};
use crate::utils::Validator;

/// Channel every new workspace starts with.
pub const DEFAULT_CHANNEL: &str = "general";

#[derive(Clone)]
pub struct WorkspaceService {
    access: Access,
    workspaces: WorkspaceRepository,
    members: MemberRepository,
    hub: EventHub,
}

impl WorkspaceService {
    pub fn new(pool: SqlitePool, hub: EventHub) -> Self {
        Self {
            access: Access::new(pool.clone()),
            workspaces: WorkspaceRepository::new(pool.clone()),
            members: MemberRepository::new(pool),
            hub,
        }
    }

    /// Workspaces the caller belongs to, newest first.
    pub async fn list(&self, user: &User) -> WorkspaceResult<Vec<WorkspaceView>> {
        let workspaces = self.workspaces.list_for_user(user.id).await?;
        Ok(workspaces.iter().map(WorkspaceView::from).collect())
    }

    pub async fn create(&self, user: &User, name: &str) -> WorkspaceResult<WorkspaceView> {
        let name = Validator::workspace_name(name)?;
        let join_code = Validator::generate_join_code();

        let (workspace, _owner) = self
            .workspaces
            .create_with_owner(&name, &join_code, user.id, DEFAULT_CHANNEL)
            .await?;

        info!(
            workspace_id = %workspace.public_id,
            user_id = %user.public_id,
            "workspace created"
        );
        Ok(WorkspaceView::from(&workspace))
    }

    pub async fn get_by_id(&self, user: &User, workspace_id: &str) -> WorkspaceResult<WorkspaceView> {
        let (workspace, _) = self.access.enter(workspace_id, user).await?;
        Ok(WorkspaceView::from(&workspace))
    }

    /// Join-page summary, open to any signed-in user.
    pub async fn get_info(&self, user: &User, workspace_id: &str) -> WorkspaceResult<WorkspaceInfo> {
        let workspace = self.access.workspace(workspace_id).await?;
        let is_member = self.access.membership(workspace.id, user).await?.is_some();

        Ok(WorkspaceInfo {
            id: workspace.public_id,
            name: workspace.name,
            image_url: workspace.image_url,
            is_member,
        })
    }

    pub async fn update(
        &self,
        user: &User,
        workspace_id: &str,
        name: &str,
        image_url: Option<&str>,
    ) -> WorkspaceResult<WorkspaceView> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;
        let name = Validator::workspace_name(name)?;
        let image_url = Validator::image_url(image_url)?;

        self.workspaces
            .update(workspace.id, &name, image_url.as_deref())
            .await?;
        let updated = self.access.workspace_by_id(workspace.id).await?;

        info!(workspace_id = %updated.public_id, "workspace updated");
        self.hub
            .publish(EventEnvelope::broadcast(
                &updated.public_id,
                WorkspaceEvent::WorkspaceUpdated {
                    name: updated.name.clone(),
                    image_url: updated.image_url.clone(),
                },
            ))
            .await;

        Ok(WorkspaceView::from(&updated))
    }

    pub async fn delete(&self, user: &User, workspace_id: &str) -> WorkspaceResult<()> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;

        self.workspaces.delete(workspace.id).await?;

        info!(
            workspace_id = %workspace.public_id,
            user_id = %user.public_id,
            "workspace deleted"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::WorkspaceDeleted,
            ))
            .await;
        self.hub.close(&workspace.public_id).await;

        Ok(())
    }

    pub async fn join(
        &self,
        user: &User,
        workspace_id: &str,
        join_code: &str,
    ) -> WorkspaceResult<MemberView> {
        let workspace = self.access.workspace(workspace_id).await?;

        if !Validator::join_code_matches(&workspace.join_code, join_code) {
            return Err(WorkspaceError::invalid("Invalid join code"));
        }

        if self.access.membership(workspace.id, user).await?.is_some() {
            return Err(WorkspaceError::conflict("Already a member of this workspace"));
        }

        let member = match self
            .members
            .create(workspace.id, user.id, MemberRole::Member)
            .await
        {
            Ok(member) => member,
            // A concurrent join won the race.
            Err(err) if err.is_unique_violation() => {
                return Err(WorkspaceError::conflict("Already a member of this workspace"))
            }
            Err(err) => return Err(err.into()),
        };

        let joined = self
            .members
            .find_with_user(member.id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Member"))?;
        let view = MemberView::from(&joined);

        info!(
            workspace_id = %workspace.public_id,
            member_id = %view.id,
            "member joined workspace"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::MemberJoined {
                    member: view.clone(),
                },
            ))
            .await;

        Ok(view)
    }

    pub async fn regenerate_join_code(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> WorkspaceResult<WorkspaceView> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;

        let join_code = Validator::generate_join_code();
        self.workspaces
            .update_join_code(workspace.id, &join_code)
            .await?;

        info!(workspace_id = %workspace.public_id, "join code regenerated");
        let updated = self.access.workspace_by_id(workspace.id).await?;
        Ok(WorkspaceView::from(&updated))
    }
}
