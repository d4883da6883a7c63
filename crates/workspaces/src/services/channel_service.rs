//! Channel management within a workspace.

use huddle_database::{Channel, ChannelRepository, User, Workspace};
use sqlx::SqlitePool;
use tracing::info;

use super::access::Access;
use crate::hub::EventHub;
use crate::types::{ChannelView, EventEnvelope, WorkspaceError, WorkspaceEvent, WorkspaceResult};
use crate::utils::Validator;

#[derive(Clone)]
pub struct ChannelService {
    access: Access,
    channels: ChannelRepository,
    hub: EventHub,
}

impl ChannelService {
    pub fn new(pool: SqlitePool, hub: EventHub) -> Self {
        Self {
            access: Access::new(pool.clone()),
            channels: ChannelRepository::new(pool),
            hub,
        }
    }

    /// Channels newest first; non-members simply see none.
    pub async fn list(&self, user: &User, workspace_id: &str) -> WorkspaceResult<Vec<ChannelView>> {
        let workspace = self.access.workspace(workspace_id).await?;
        if self.access.membership(workspace.id, user).await?.is_none() {
            return Ok(Vec::new());
        }

        let channels = self.channels.list_by_workspace(workspace.id).await?;
        Ok(channels.iter().map(ChannelView::from).collect())
    }

    pub async fn create(
        &self,
        user: &User,
        workspace_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> WorkspaceResult<ChannelView> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;
        let name = Validator::channel_name(name)?;
        let description = Validator::description(description)?;

        let channel = self
            .channels
            .create(workspace.id, &name, description.as_deref())
            .await?;
        let view = ChannelView::from(&channel);

        info!(
            workspace_id = %workspace.public_id,
            channel_id = %view.id,
            name = %view.name,
            "channel created"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::ChannelCreated {
                    channel: view.clone(),
                },
            ))
            .await;

        Ok(view)
    }

    pub async fn get(
        &self,
        user: &User,
        workspace_id: &str,
        channel_id: &str,
    ) -> WorkspaceResult<ChannelView> {
        let (workspace, _) = self.access.enter(workspace_id, user).await?;
        let channel = self.find_in(&workspace, channel_id).await?;
        Ok(ChannelView::from(&channel))
    }

    pub async fn update(
        &self,
        user: &User,
        workspace_id: &str,
        channel_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> WorkspaceResult<ChannelView> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;
        let channel = self.find_in(&workspace, channel_id).await?;
        let name = Validator::channel_name(name)?;
        let description = Validator::description(description)?;

        self.channels
            .update(channel.id, &name, description.as_deref())
            .await?;
        let updated = self
            .channels
            .find_by_id(channel.id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Channel"))?;
        let view = ChannelView::from(&updated);

        info!(workspace_id = %workspace.public_id, channel_id = %view.id, "channel updated");
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::ChannelUpdated {
                    channel: view.clone(),
                },
            ))
            .await;

        Ok(view)
    }

    /// Delete a channel and every message posted in it.
    pub async fn delete(
        &self,
        user: &User,
        workspace_id: &str,
        channel_id: &str,
    ) -> WorkspaceResult<()> {
        let (workspace, _) = self.access.enter_as_admin(workspace_id, user).await?;
        let channel = self.find_in(&workspace, channel_id).await?;

        self.channels.delete(channel.id).await?;

        info!(
            workspace_id = %workspace.public_id,
            channel_id = %channel.public_id,
            "channel deleted"
        );
        self.hub
            .publish(EventEnvelope::broadcast(
                &workspace.public_id,
                WorkspaceEvent::ChannelDeleted {
                    channel_id: channel.public_id,
                },
            ))
            .await;

        Ok(())
    }

    async fn find_in(&self, workspace: &Workspace, channel_id: &str) -> WorkspaceResult<Channel> {
        self.channels
            .find_by_public_id(channel_id)
            .await?
            .filter(|channel| channel.workspace_id == workspace.id)
            .ok_or_else(|| WorkspaceError::not_found("Channel"))
    }
}
