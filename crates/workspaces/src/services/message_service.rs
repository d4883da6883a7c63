//! Posting, listing and editing messages, plus reactions.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use huddle_config::MessagesConfig;
use huddle_database::{
    Channel, ChannelRepository, Conversation, ConversationRepository, FileRepository,
    MemberRepository, Message, MessageRepository, MessageScope, NewMessage, ReactionRepository,
    User, Workspace, WorkspaceMember,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::access::Access;
use super::file_service::file_url;
use crate::hub::EventHub;
use crate::read_model::{decode_cursor, encode_cursor, group_by_date, group_reactions};
use crate::types::{
    AttachmentView, CreateMessageRequest, EventEnvelope, MemberView, MessagePageView,
    MessageQuery, MessageView, ReactionToggle, ThreadView, TimelineView, WorkspaceError,
    WorkspaceEvent, WorkspaceResult,
};
use crate::utils::{PermissionChecker, Validator};

#[derive(Clone)]
pub struct MessageService {
    access: Access,
    messages: MessageRepository,
    reactions: ReactionRepository,
    channels: ChannelRepository,
    conversations: ConversationRepository,
    members: MemberRepository,
    files: FileRepository,
    hub: EventHub,
    paging: MessagesConfig,
    public_url: String,
}

impl MessageService {
    pub fn new(
        pool: SqlitePool,
        hub: EventHub,
        paging: MessagesConfig,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            access: Access::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            reactions: ReactionRepository::new(pool.clone()),
            channels: ChannelRepository::new(pool.clone()),
            conversations: ConversationRepository::new(pool.clone()),
            members: MemberRepository::new(pool.clone()),
            files: FileRepository::new(pool),
            hub,
            paging,
            public_url: public_url.into(),
        }
    }

    pub async fn create(
        &self,
        user: &User,
        request: CreateMessageRequest,
    ) -> WorkspaceResult<MessageView> {
        let (workspace, me) = self.access.enter(&request.workspace_id, user).await?;

        let text = Validator::message_text(request.text.as_deref())?;
        let file_ids = self.resolve_files(user, &request.files).await?;
        if text.is_none() && file_ids.is_empty() {
            return Err(WorkspaceError::invalid(
                "A message needs text or at least one file",
            ));
        }

        let target = self.resolve_target(&workspace, &me, &request).await?;

        let message = self
            .messages
            .create(
                NewMessage {
                    workspace_id: workspace.id,
                    member_id: me.id,
                    channel_id: target.channel_id,
                    conversation_id: target.conversation_id,
                    parent_message_id: target.parent_message_id,
                    text,
                },
                &file_ids,
            )
            .await?;

        let view = ViewBuilder::new(self)
            .build(&message)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Member"))?;

        info!(
            workspace_id = %workspace.public_id,
            message_id = %message.public_id,
            files = file_ids.len(),
            reply = message.is_thread_reply(),
            "message created"
        );
        let audience = self.audience(&message).await?;
        self.publish(
            &workspace,
            WorkspaceEvent::MessageCreated {
                message: view.clone(),
            },
            audience,
        )
        .await;

        Ok(view)
    }

    /// One page of messages, newest first.
    pub async fn list(&self, user: &User, query: MessageQuery) -> WorkspaceResult<MessagePageView> {
        let (page, _older) = self.page(user, query).await?;
        Ok(page)
    }

    /// Same listing as [`MessageService::list`], grouped by day for display.
    pub async fn timeline(&self, user: &User, query: MessageQuery) -> WorkspaceResult<TimelineView> {
        let (page, older) = self.page(user, query).await?;
        Ok(TimelineView {
            groups: group_by_date(page.page, older.as_ref(), &Utc::now()),
            is_done: page.is_done,
            continue_cursor: page.continue_cursor,
        })
    }

    /// One page of views plus the view of the message just past it, which
    /// decides whether the page's oldest entry is compact.
    async fn page(
        &self,
        user: &User,
        query: MessageQuery,
    ) -> WorkspaceResult<(MessagePageView, Option<MessageView>)> {
        let (workspace, me) = self.access.enter(&query.workspace_id, user).await?;
        let scope = self.resolve_scope(&workspace, &me, &query).await?;

        let before = query.cursor.as_deref().map(decode_cursor).transpose()?;
        let limit = self.paging.page_size(query.num_items);

        let page = self.messages.list_page(scope, before, limit).await?;
        let continue_cursor = page.messages.last().map(|m| encode_cursor(m.id));

        let mut builder = ViewBuilder::new(self);
        let mut views = Vec::with_capacity(page.messages.len());
        for message in &page.messages {
            match builder.build(message).await? {
                Some(view) => views.push(view),
                None => {
                    warn!(message_id = %message.public_id, "dropping message with missing author")
                }
            }
        }

        let older = match &page.older {
            Some(message) => builder.build(message).await?,
            None => None,
        };

        Ok((
            MessagePageView {
                page: views,
                is_done: page.is_done,
                continue_cursor,
            },
            older,
        ))
    }

    pub async fn get(&self, user: &User, message_id: &str) -> WorkspaceResult<MessageView> {
        let (message, me) = self.load(user, message_id).await?;
        self.ensure_visible(&me, &message).await?;

        ViewBuilder::new(self)
            .build(&message)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Message"))
    }

    pub async fn update(
        &self,
        user: &User,
        message_id: &str,
        text: &str,
    ) -> WorkspaceResult<MessageView> {
        let (message, me) = self.load(user, message_id).await?;
        PermissionChecker::require_author(&me, &message)?;

        let text = Validator::message_text(Some(text))?
            .ok_or_else(|| WorkspaceError::invalid("Message text cannot be empty"))?;

        self.messages.update_text(message.id, &text).await?;
        let updated = self
            .messages
            .find_by_id(message.id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Message"))?;

        let view = ViewBuilder::new(self)
            .build(&updated)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Message"))?;

        let workspace = self.access.workspace_by_id(updated.workspace_id).await?;
        let audience = self.audience(&updated).await?;
        self.publish(
            &workspace,
            WorkspaceEvent::MessageUpdated {
                message_id: updated.public_id.clone(),
                text,
                updated_at: updated.updated_at.unwrap_or_else(Utc::now),
            },
            audience,
        )
        .await;

        Ok(view)
    }

    /// Delete a message with its thread replies and reactions.
    pub async fn delete(&self, user: &User, message_id: &str) -> WorkspaceResult<()> {
        let (message, me) = self.load(user, message_id).await?;
        PermissionChecker::require_author(&me, &message)?;

        let audience = self.audience(&message).await?;
        self.messages.delete(message.id).await?;

        let workspace = self.access.workspace_by_id(message.workspace_id).await?;
        info!(
            workspace_id = %workspace.public_id,
            message_id = %message.public_id,
            "message deleted"
        );
        self.publish(
            &workspace,
            WorkspaceEvent::MessageDeleted {
                message_id: message.public_id,
            },
            audience,
        )
        .await;

        Ok(())
    }

    /// Add the caller's `emoji` to a message, or take it back if present.
    pub async fn toggle_reaction(
        &self,
        user: &User,
        message_id: &str,
        emoji: &str,
    ) -> WorkspaceResult<ReactionToggle> {
        let (message, me) = self.load(user, message_id).await?;
        self.ensure_visible(&me, &message).await?;
        let emoji = Validator::emoji(emoji)?;

        let added = match self.reactions.find(message.id, me.id, &emoji).await? {
            Some(existing) => {
                self.reactions.delete(existing.id).await?;
                false
            }
            None => match self
                .reactions
                .create(message.workspace_id, message.id, me.id, &emoji)
                .await
            {
                Ok(_) => true,
                // Someone else's toggle already inserted the same row.
                Err(err) if err.is_unique_violation() => true,
                Err(err) => return Err(err.into()),
            },
        };

        let workspace = self.access.workspace_by_id(message.workspace_id).await?;
        let audience = self.audience(&message).await?;
        self.publish(
            &workspace,
            WorkspaceEvent::ReactionToggled {
                message_id: message.public_id.clone(),
                member_id: me.public_id.clone(),
                emoji: emoji.clone(),
                added,
            },
            audience,
        )
        .await;

        Ok(ReactionToggle {
            message_id: message.public_id,
            emoji,
            added,
        })
    }

    async fn load(&self, user: &User, message_id: &str) -> WorkspaceResult<(Message, WorkspaceMember)> {
        let message = self
            .messages
            .find_by_public_id(message_id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Message"))?;
        let me = self.access.member_of(message.workspace_id, user).await?;
        Ok((message, me))
    }

    /// Conversation messages are private to the two participants.
    async fn ensure_visible(&self, me: &WorkspaceMember, message: &Message) -> WorkspaceResult<()> {
        let Some(conversation_id) = message.conversation_id else {
            return Ok(());
        };
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .await?
            .ok_or_else(|| WorkspaceError::not_found("Conversation"))?;
        if !conversation.involves(me.id) {
            return Err(WorkspaceError::unauthorized());
        }
        Ok(())
    }

    async fn resolve_files(&self, user: &User, storage_ids: &[String]) -> WorkspaceResult<Vec<i64>> {
        Validator::attachment_set(storage_ids.len(), 0)?;

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(storage_ids.len());
        let mut total_bytes = 0u64;

        for storage_id in storage_ids {
            if !seen.insert(storage_id.as_str()) {
                return Err(WorkspaceError::invalid("The same file is attached twice"));
            }
            let file = self
                .files
                .find_by_storage_id(storage_id)
                .await?
                .ok_or_else(|| WorkspaceError::not_found("File"))?;
            if file.uploaded_by != user.id {
                return Err(WorkspaceError::unauthorized());
            }
            total_bytes += u64::try_from(file.byte_size).unwrap_or(0);
            ids.push(file.id);
        }

        Validator::attachment_set(ids.len(), total_bytes)?;
        Ok(ids)
    }

    async fn resolve_target(
        &self,
        workspace: &Workspace,
        me: &WorkspaceMember,
        request: &CreateMessageRequest,
    ) -> WorkspaceResult<Target> {
        let target = if let Some(parent_id) = request.parent_message_id.as_deref() {
            let parent = self.message_in(workspace, parent_id).await?;
            if parent.is_thread_reply() {
                return Err(WorkspaceError::invalid("Replies cannot have replies"));
            }

            let target = Target {
                channel_id: parent.channel_id,
                conversation_id: parent.conversation_id,
                parent_message_id: Some(parent.id),
            };

            // An explicit location must agree with the parent's.
            if let Some(channel_id) = request.channel_id.as_deref() {
                let channel = self.channel_in(workspace, channel_id).await?;
                if target.channel_id != Some(channel.id) {
                    return Err(WorkspaceError::invalid("Parent message is in another channel"));
                }
            }
            if let Some(conversation_id) = request.conversation_id.as_deref() {
                let conversation = self.conversation_in(workspace, conversation_id).await?;
                if target.conversation_id != Some(conversation.id) {
                    return Err(WorkspaceError::invalid(
                        "Parent message is in another conversation",
                    ));
                }
            }
            target
        } else {
            match (
                request.channel_id.as_deref(),
                request.conversation_id.as_deref(),
            ) {
                (Some(channel_id), None) => Target {
                    channel_id: Some(self.channel_in(workspace, channel_id).await?.id),
                    conversation_id: None,
                    parent_message_id: None,
                },
                (None, Some(conversation_id)) => Target {
                    channel_id: None,
                    conversation_id: Some(self.conversation_in(workspace, conversation_id).await?.id),
                    parent_message_id: None,
                },
                _ => {
                    return Err(WorkspaceError::invalid(
                        "Exactly one of channel, conversation or parent message is required",
                    ))
                }
            }
        };

        if let Some(conversation_id) = target.conversation_id {
            let conversation = self
                .conversations
                .find_by_id(conversation_id)
                .await?
                .ok_or_else(|| WorkspaceError::not_found("Conversation"))?;
            if !conversation.involves(me.id) {
                return Err(WorkspaceError::unauthorized());
            }
        }

        Ok(target)
    }

    async fn resolve_scope(
        &self,
        workspace: &Workspace,
        me: &WorkspaceMember,
        query: &MessageQuery,
    ) -> WorkspaceResult<MessageScope> {
        match (
            query.channel_id.as_deref(),
            query.conversation_id.as_deref(),
            query.parent_message_id.as_deref(),
        ) {
            (Some(channel_id), None, None) => {
                let channel = self.channel_in(workspace, channel_id).await?;
                Ok(MessageScope::Channel(channel.id))
            }
            (None, Some(conversation_id), None) => {
                let conversation = self.conversation_in(workspace, conversation_id).await?;
                if !conversation.involves(me.id) {
                    return Err(WorkspaceError::unauthorized());
                }
                Ok(MessageScope::Conversation(conversation.id))
            }
            (None, None, Some(parent_id)) => {
                let parent = self.message_in(workspace, parent_id).await?;
                self.ensure_visible(me, &parent).await?;
                Ok(MessageScope::Thread(parent.id))
            }
            _ => Err(WorkspaceError::invalid(
                "Exactly one of channel, conversation or parent message is required",
            )),
        }
    }

    async fn channel_in(
        &self,
        workspace: &Workspace,
        channel_id: &str,
    ) -> WorkspaceResult<Channel> {
        self.channels
            .find_by_public_id(channel_id)
            .await?
            .filter(|channel| channel.workspace_id == workspace.id)
            .ok_or_else(|| WorkspaceError::not_found("Channel"))
    }

    async fn conversation_in(
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

    async fn message_in(&self, workspace: &Workspace, message_id: &str) -> WorkspaceResult<Message> {
        self.messages
            .find_by_public_id(message_id)
            .await?
            .filter(|message| message.workspace_id == workspace.id)
            .ok_or_else(|| WorkspaceError::not_found("Message"))
    }

    /// Who may see events about `message`: everyone, unless it lives in a
    /// conversation.
    async fn audience(&self, message: &Message) -> WorkspaceResult<Option<Vec<String>>> {
        let Some(conversation_id) = message.conversation_id else {
            return Ok(None);
        };
        let Some(conversation) = self.conversations.find_by_id(conversation_id).await? else {
            return Ok(Some(Vec::new()));
        };

        let mut audience = Vec::with_capacity(2);
        for member_id in [conversation.member_one_id, conversation.member_two_id] {
            if let Some(member) = self.members.find_by_id(member_id).await? {
                if !audience.contains(&member.public_id) {
                    audience.push(member.public_id);
                }
            }
        }
        Ok(Some(audience))
    }

    async fn publish(
        &self,
        workspace: &Workspace,
        event: WorkspaceEvent,
        audience: Option<Vec<String>>,
    ) {
        let envelope = match audience {
            Some(audience) => EventEnvelope::restricted(&workspace.public_id, event, audience),
            None => EventEnvelope::broadcast(&workspace.public_id, event),
        };
        self.hub.publish(envelope).await;
    }
}

struct Target {
    channel_id: Option<i64>,
    conversation_id: Option<i64>,
    parent_message_id: Option<i64>,
}

/// Denormalizes messages into [`MessageView`]s, remembering lookups so a
/// page with one author costs one member query.
struct ViewBuilder<'a> {
    service: &'a MessageService,
    members: HashMap<i64, Option<MemberView>>,
    channels: HashMap<i64, Option<String>>,
    conversations: HashMap<i64, Option<String>>,
    parents: HashMap<i64, Option<String>>,
}

impl<'a> ViewBuilder<'a> {
    fn new(service: &'a MessageService) -> Self {
        Self {
            service,
            members: HashMap::new(),
            channels: HashMap::new(),
            conversations: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    /// `None` when the author's member or user row is gone.
    async fn build(&mut self, message: &Message) -> WorkspaceResult<Option<MessageView>> {
        let Some(member) = self.member(message.member_id).await? else {
            return Ok(None);
        };

        let channel_id = match message.channel_id {
            Some(id) => self.channel(id).await?,
            None => None,
        };
        let conversation_id = match message.conversation_id {
            Some(id) => self.conversation(id).await?,
            None => None,
        };
        let parent_message_id = match message.parent_message_id {
            Some(id) => self.parent(id).await?,
            None => None,
        };

        let attachments = self
            .service
            .messages
            .attachments(message.id)
            .await?
            .iter()
            .map(|file| {
                AttachmentView::new(file, file_url(&self.service.public_url, &file.storage_id))
            })
            .collect();

        let mut reacted = Vec::new();
        for reaction in self.service.reactions.list_by_message(message.id).await? {
            if let Some(reactor) = self.member(reaction.member_id).await? {
                reacted.push((reaction.emoji, reactor.id));
            }
        }
        let reactions = group_reactions(reacted.iter().map(|(e, m)| (e.as_str(), m.as_str())));

        let summary = self.service.messages.thread_summary(message.id).await?;
        let last_replier = match summary.last_reply_member_id {
            Some(id) => self.member(id).await?,
            None => None,
        };
        let thread = ThreadView {
            count: summary.count,
            last_reply_at: summary.last_reply_at,
            last_reply_name: last_replier.as_ref().map(|m| m.user.name.clone()),
            last_reply_image: last_replier.and_then(|m| m.user.image_url),
        };

        Ok(Some(MessageView {
            id: message.public_id.clone(),
            channel_id,
            conversation_id,
            parent_message_id,
            text: message.text.clone(),
            created_at: message.created_at,
            updated_at: message.updated_at,
            member,
            attachments,
            reactions,
            thread,
        }))
    }

    async fn member(&mut self, id: i64) -> WorkspaceResult<Option<MemberView>> {
        if let Some(cached) = self.members.get(&id) {
            return Ok(cached.clone());
        }
        let view = self
            .service
            .members
            .find_with_user(id)
            .await?
            .as_ref()
            .map(MemberView::from);
        if view.is_none() {
            debug!(member_id = id, "member lookup missed");
        }
        self.members.insert(id, view.clone());
        Ok(view)
    }

    async fn channel(&mut self, id: i64) -> WorkspaceResult<Option<String>> {
        if let Some(cached) = self.channels.get(&id) {
            return Ok(cached.clone());
        }
        let public_id = self
            .service
            .channels
            .find_by_id(id)
            .await?
            .map(|c| c.public_id);
        self.channels.insert(id, public_id.clone());
        Ok(public_id)
    }

    async fn conversation(&mut self, id: i64) -> WorkspaceResult<Option<String>> {
        if let Some(cached) = self.conversations.get(&id) {
            return Ok(cached.clone());
        }
        let public_id = self
            .service
            .conversations
            .find_by_id(id)
            .await?
            .map(|c| c.public_id);
        self.conversations.insert(id, public_id.clone());
        Ok(public_id)
    }

    async fn parent(&mut self, id: i64) -> WorkspaceResult<Option<String>> {
        if let Some(cached) = self.parents.get(&id) {
            return Ok(cached.clone());
        }
        let public_id = self
            .service
            .messages
            .find_by_id(id)
            .await?
            .map(|m| m.public_id);
        self.parents.insert(id, public_id.clone());
        Ok(public_id)
    }
}
