//! Repository implementations for data access

pub mod channel_repository;
pub mod conversation_repository;
pub mod file_repository;
pub mod member_repository;
pub mod message_repository;
pub mod reaction_repository;
pub mod user_repository;
pub mod workspace_repository;

pub use channel_repository::ChannelRepository;
pub use conversation_repository::ConversationRepository;
pub use file_repository::FileRepository;
pub use member_repository::MemberRepository;
pub use message_repository::{MessagePage, MessageRepository};
pub use reaction_repository::ReactionRepository;
pub use user_repository::UserRepository;
pub use workspace_repository::WorkspaceRepository;
