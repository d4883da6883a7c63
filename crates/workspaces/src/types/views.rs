//! Read models handed to API callers.
//!
//! Views only ever expose public ids; internal row ids stay in the
//! database layer.

use chrono::{DateTime, Utc};
use huddle_database::{
    Channel, FileKind, MemberRole, MemberWithUser, StoredFile, User, Workspace,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.public_id.clone(),
            name: user.name().to_string(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceView {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    /// Only built for members, so the join code stays inside the workspace.
    pub join_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workspace> for WorkspaceView {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.public_id.clone(),
            name: workspace.name.clone(),
            image_url: workspace.image_url.clone(),
            join_code: workspace.join_code.clone(),
            created_at: workspace.created_at,
            updated_at: workspace.updated_at,
        }
    }
}

/// What the join page may show to anyone signed in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceInfo {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub is_member: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberView {
    pub id: String,
    #[schema(value_type = String)]
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub user: UserView,
}

impl From<&MemberWithUser> for MemberView {
    fn from(value: &MemberWithUser) -> Self {
        Self {
            id: value.member.public_id.clone(),
            role: value.member.role,
            joined_at: value.member.joined_at,
            user: UserView::from(&value.user),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChannelView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Channel> for ChannelView {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.public_id.clone(),
            name: channel.name.clone(),
            description: channel.description.clone(),
            created_at: channel.created_at,
            updated_at: channel.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationView {
    pub id: String,
    pub member_one_id: String,
    pub member_two_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationWithMember {
    #[serde(flatten)]
    pub conversation: ConversationView,
    pub other_member: MemberView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AttachmentView {
    /// Storage id of the blob.
    pub id: String,
    pub name: String,
    pub content_type: String,
    #[schema(value_type = String)]
    pub kind: FileKind,
    pub size: i64,
    pub url: String,
}

impl AttachmentView {
    pub fn new(file: &StoredFile, url: String) -> Self {
        Self {
            id: file.storage_id.clone(),
            name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            kind: file.kind,
            size: file.byte_size,
            url,
        }
    }
}

/// Reactions sharing one emoji.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ReactionGroup {
    pub emoji: String,
    pub count: usize,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ThreadView {
    pub count: i64,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub last_reply_name: Option<String>,
    pub last_reply_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageView {
    pub id: String,
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub member: MemberView,
    pub attachments: Vec<AttachmentView>,
    pub reactions: Vec<ReactionGroup>,
    pub thread: ThreadView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessagePageView {
    pub page: Vec<MessageView>,
    pub is_done: bool,
    pub continue_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub message: MessageView,
    pub is_compact: bool,
    pub time_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DateGroup {
    /// `YYYY-MM-DD` in UTC.
    pub date: String,
    pub label: String,
    pub messages: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimelineView {
    pub groups: Vec<DateGroup>,
    pub is_done: bool,
    pub continue_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReactionToggle {
    pub message_id: String,
    pub emoji: String,
    pub added: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>, email: Option<&str>) -> User {
        User {
            id: 1,
            public_id: "u1".into(),
            email: email.map(str::to_string),
            display_name: display_name.map(str::to_string),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn user_view_prefers_display_name() {
        let view = UserView::from(&user(Some("Ada"), Some("ada@example.com")));
        assert_eq!(view.name, "Ada");
        assert_eq!(view.id, "u1");

        let view = UserView::from(&user(None, Some("ada@example.com")));
        assert_eq!(view.name, "ada@example.com");
    }

    #[test]
    fn conversation_with_member_flattens() {
        let now = Utc::now();
        let value = ConversationWithMember {
            conversation: ConversationView {
                id: "c1".into(),
                member_one_id: "m1".into(),
                member_two_id: "m2".into(),
                created_at: now,
            },
            other_member: MemberView {
                id: "m2".into(),
                role: MemberRole::Member,
                joined_at: now,
                user: UserView::from(&user(Some("Bo"), None)),
            },
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["other_member"]["role"], "member");
        assert_eq!(json["other_member"]["user"]["name"], "Bo");
    }
}
