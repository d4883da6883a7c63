//! Event types for real-time workspace updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::views::{ChannelView, ConversationView, MemberView, MessageView};

/// Change notifications pushed to workspace subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WorkspaceEvent {
    MessageCreated {
        message: MessageView,
    },
    MessageUpdated {
        message_id: String,
        text: String,
        updated_at: DateTime<Utc>,
    },
    MessageDeleted {
        message_id: String,
    },
    ReactionToggled {
        message_id: String,
        member_id: String,
        emoji: String,
        added: bool,
    },
    ChannelCreated {
        channel: ChannelView,
    },
    ChannelUpdated {
        channel: ChannelView,
    },
    ChannelDeleted {
        channel_id: String,
    },
    MemberJoined {
        member: MemberView,
    },
    MemberUpdated {
        member_id: String,
        role: String,
    },
    MemberRemoved {
        member_id: String,
    },
    ConversationCreated {
        conversation: ConversationView,
    },
    WorkspaceUpdated {
        name: String,
        image_url: Option<String>,
    },
    WorkspaceDeleted,
}

impl WorkspaceEvent {
    /// Event type name for logging
    pub fn event_type_name(&self) -> &'static str {
        match self {
            WorkspaceEvent::MessageCreated { .. } => "message_created",
            WorkspaceEvent::MessageUpdated { .. } => "message_updated",
            WorkspaceEvent::MessageDeleted { .. } => "message_deleted",
            WorkspaceEvent::ReactionToggled { .. } => "reaction_toggled",
            WorkspaceEvent::ChannelCreated { .. } => "channel_created",
            WorkspaceEvent::ChannelUpdated { .. } => "channel_updated",
            WorkspaceEvent::ChannelDeleted { .. } => "channel_deleted",
            WorkspaceEvent::MemberJoined { .. } => "member_joined",
            WorkspaceEvent::MemberUpdated { .. } => "member_updated",
            WorkspaceEvent::MemberRemoved { .. } => "member_removed",
            WorkspaceEvent::ConversationCreated { .. } => "conversation_created",
            WorkspaceEvent::WorkspaceUpdated { .. } => "workspace_updated",
            WorkspaceEvent::WorkspaceDeleted => "workspace_deleted",
        }
    }
}

/// An event plus who may see it.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub workspace_id: String,
    #[serde(flatten)]
    pub event: WorkspaceEvent,
    /// Member public ids allowed to receive the event; `None` means every
    /// member of the workspace.
    #[serde(skip)]
    pub audience: Option<Vec<String>>,
}

impl EventEnvelope {
    pub fn broadcast(workspace_id: impl Into<String>, event: WorkspaceEvent) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            event,
            audience: None,
        }
    }

    pub fn restricted(
        workspace_id: impl Into<String>,
        event: WorkspaceEvent,
        audience: Vec<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            event,
            audience: Some(audience),
        }
    }

    pub fn visible_to(&self, member_id: &str) -> bool {
        self.audience
            .as_ref()
            .map_or(true, |members| members.iter().any(|m| m == member_id))
    }

    /// Whether a subscriber identified by `member_id` should be cut off.
    pub fn ends_subscription_for(&self, member_id: &str) -> bool {
        match &self.event {
            WorkspaceEvent::WorkspaceDeleted => true,
            WorkspaceEvent::MemberRemoved { member_id: removed } => removed == member_id,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_serialize_with_type_tag() {
        let envelope = EventEnvelope::broadcast(
            "w1",
            WorkspaceEvent::MessageDeleted {
                message_id: "m1".into(),
            },
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["workspace_id"], "w1");
        assert_eq!(json["type"], "message_deleted");
        assert_eq!(json["data"]["message_id"], "m1");
        assert!(json.get("audience").is_none());
    }

    #[test]
    fn restricted_envelopes_only_reach_their_audience() {
        let envelope = EventEnvelope::restricted(
            "w1",
            WorkspaceEvent::MessageDeleted {
                message_id: "m1".into(),
            },
            vec!["a".into(), "b".into()],
        );
        assert!(envelope.visible_to("a"));
        assert!(!envelope.visible_to("c"));
        assert!(EventEnvelope::broadcast("w1", WorkspaceEvent::WorkspaceDeleted).visible_to("c"));
    }

    #[test]
    fn removal_and_deletion_end_subscriptions() {
        let removed = EventEnvelope::broadcast(
            "w1",
            WorkspaceEvent::MemberRemoved {
                member_id: "a".into(),
            },
        );
        assert!(removed.ends_subscription_for("a"));
        assert!(!removed.ends_subscription_for("b"));
        assert!(EventEnvelope::broadcast("w1", WorkspaceEvent::WorkspaceDeleted)
            .ends_subscription_for("b"));
    }
}
