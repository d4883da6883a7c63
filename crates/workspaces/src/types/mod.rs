//! Shared types for workspace operations.

pub mod errors;
pub mod events;
pub mod requests;
pub mod views;

pub use errors::{WorkspaceError, WorkspaceResult};
pub use events::{EventEnvelope, WorkspaceEvent};
pub use requests::{CreateMessageRequest, MessageQuery};
pub use views::{
    AttachmentView, ChannelView, ConversationView, ConversationWithMember, DateGroup,
    MemberView, MessagePageView, MessageView, ReactionGroup, ReactionToggle, ThreadView,
    TimelineEntry, TimelineView, UserView, WorkspaceInfo, WorkspaceView,
};
