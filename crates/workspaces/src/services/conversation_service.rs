//! Direct-message conversations between two members.

use huddle_database::{
    Conversation, ConversationRepository, MemberRepository, User, Workspace, WorkspaceMember,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::access::Access;
use crate::hub::EventHub;
use crate::types::{
    ConversationView, ConversationWithMember, EventEnvelope, MemberView, WorkspaceError,
    WorkspaceEvent, WorkspaceResult,
};

#[derive(Clone)]
pub struct ConversationService {
    access: Access,
    conversations: ConversationRepository,
    members: MemberRepository,
    hub: EventHub,
}

impl ConversationService {
    pub fn new(pool: SqlitePool, hub: EventHub) -> Self {
        Self {
            access: Access::new(pool.clone()),
            conversations: ConversationRepository::new(pool.clone()),
            members: MemberRepository::new(pool),
            hub,
        }
    }

    /// Return the conversation between the caller and `member_id`, opening
    /// one if none exists yet.
    pub async fn create_or_get(
        &self,
        user: &User,
        workspace_id: &str,
        member_id: &str,
    ) -> WorkspaceResult<ConversationWithMember> {
        let (workspace, me) = self.access.enter(workspace_id, user).await?;
        let other = self
            .members
            .find_by_public_id(member_id)
            .await?
            .filter(|member| member.workspace_id == workspace.id)
            .ok_or_else(|| WorkspaceError::not_found("Member"))?;

        if let Some(existing) = self
            .conversations
            .find_between(workspace.id, me.id, other.id)
            .await?
        {
            return self.with_other_member(&existing, &me).await;
        }

        let conversation = match self
            .conversations
            .create(workspace.id, me.id, other.id)
            .await
        {
            Ok(conversation) => conversation,
            // The other side opened it concurrently; hand back their row.
            Err(err) if err.is_unique_violation() => {
                let existing = self
                    .conversations
                    .find_between(workspace.id, me.id, other.id)
                    .await?
                    .ok_or_else(|| WorkspaceError::not_found("Conversation"))?;
                return self.with_other_member(&existing, &me).await;
            }
            Err(err) => return Err(err.into()),
        };
        let view = self.view(&conversation).await?;

        info!(
            workspace_id = %workspace.public_id,
            conversation_id = %conversation.public_id,
            "conversation opened"
        );
        self.hub
            .publish(EventEnvelope::restricted(
                &workspace.public_id,
                WorkspaceEvent::ConversationCreated {
                    conversation: view.clone(),
                },
                participants(&view),
            ))
            .await;

        Ok(ConversationWithMember {
            conversation: view,
            other_member: self.member_view(other.id).await?,
        })
    }

    /// Conversations the caller takes part in, newest first.
    pub async fn list(
        &self,
        user: &User,
        workspace_id: &str,
    ) -> WorkspaceResult<Vec<ConversationWithMember>> {
        let (workspace, me) = self.access.enter(workspace_id, user).await?;
        let conversations = self
            .conversations
            .list_for_member(workspace.id, me.id)
            .await?;

        let mut result = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            match self.with_other_member(conversation, &me).await {
                Ok(entry) => result.push(entry),
                Err(WorkspaceError::NotFound { .. }) => {
                    warn!(conversation_id = %conversation.public_id, "dropping conversation with missing member");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(result)
    }

    pub async fn get(
        &self,
        user: &User,
        workspace_id: &str,
        conversation_id: &str,
    ) -> WorkspaceResult<ConversationWithMember> {
        let (workspace, me) = self.access.enter(workspace_id, user).await?;
        let conversation = self.find_in(&workspace, conversation_id).await?;
        if !conversation.involves(me.id) {
            return Err(WorkspaceError::unauthorized());
        }
        self.with_other_member(&conversation, &me).await
    }

    pub(crate) async fn find_in(
        &self,
        workspace: &Workspace,
        conversation_id: &str,
    ) -> WorkspaceResult<Conversation> {
        self.conversations
            .find_by_public_id(conversation_id)
            .await?
            .filter(|conversation| conversation.workspace_id == workspace.id)
            .ok_or_else(|| WorkspaceError::not_found("Conversation"))
    }

    async fn with_other_member(
        &self,
        conversation: &Conversation,
        me: &WorkspaceMember,
    ) -> WorkspaceResult<ConversationWithMember> {
        Ok(ConversationWithMember {
            conversation: self.view(conversation).await?,
            other_member: self.member_view(conversation.other_member(me.id)).await?,
        })
    }

    async fn view(&self, conversation: &Conversation) -> WorkspaceResult<ConversationView> {
        let one = self.member_public_id(conversation.member_one_id).await?;
        let two = self.member_public_id(conversation.member_two_id).await?;
        Ok(ConversationView {
            id: conversation.public_id.clone(),
            member_one_id: one,
            member_two_id: two,
            created_at: conversation.created_at,
        })
    }

    async fn member_public_id(&self, member_id: i64) -> WorkspaceResult<String> {
        self.members
            .find_by_id(member_id)
            .await?
            .map(|member| member.public_id)
            .ok_or_else(|| WorkspaceError::not_found("Member"))
    }

    async fn member_view(&self, member_id: i64) -> WorkspaceResult<MemberView> {
        self.members
            .find_with_user(member_id)
            .await?
            .as_ref()
            .map(MemberView::from)
            .ok_or_else(|| WorkspaceError::not_found("Member"))
    }
}

/// Member public ids allowed to see events about a conversation.
pub(crate) fn participants(conversation: &ConversationView) -> Vec<String> {
    let mut ids = vec![conversation.member_one_id.clone()];
    if conversation.member_two_id != conversation.member_one_id {
        ids.push(conversation.member_two_id.clone());
    }
    ids
}
