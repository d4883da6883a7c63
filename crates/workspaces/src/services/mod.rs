//! Business logic services.
//!
//! Every operation takes the signed-in [`huddle_database::User`], checks
//! membership and role through [`access::Access`], performs the change via
//! the repositories and publishes a [`crate::WorkspaceEvent`] on success.

pub mod access;
pub mod channel_service;
pub mod conversation_service;
pub mod file_service;
pub mod member_service;
pub mod message_service;
pub mod workspace_service;

pub use access::Access;
pub use channel_service::ChannelService;
pub use conversation_service::ConversationService;
pub use file_service::{file_url, FileService};
pub use member_service::MemberService;
pub use message_service::MessageService;
pub use workspace_service::{WorkspaceService, DEFAULT_CHANNEL};
