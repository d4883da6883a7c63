//! Huddle database crate
//!
//! SQLite persistence for workspaces, members, channels, conversations,
//! messages, reactions and file metadata: pool setup, embedded
//! migrations, row entities and repositories.

use huddle_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{prepare_database, DatabaseConnection};
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{
    ChannelRepository, ConversationRepository, FileRepository, MemberRepository, MessagePage,
    MessageRepository, ReactionRepository, UserRepository, WorkspaceRepository,
};

pub use entities::{
    new_public_id, Channel, Conversation, FileKind, MemberRole, MemberWithUser, Message,
    MessageScope, NewMessage, NewStoredFile, Reaction, StoredFile, ThreadSummary, User, Workspace,
    WorkspaceMember,
};

pub use types::{DatabaseError, DatabaseResult};

pub use sqlx::Pool;

/// Connect and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool).await?;

    Ok(pool)
}
