//! # Huddle Workspaces Crate
//!
//! Domain logic for team chat: workspaces and their members, channels,
//! direct conversations, messages with threads, reactions and file
//! attachments.
//!
//! ## Architecture
//!
//! - **Services**: authorization plus business rules over the repositories
//! - **Read model**: reaction grouping, date grouping and cursors
//! - **Hub**: per-workspace broadcast of change events
//! - **Storage**: on-disk blobs for uploads
//! - **Types**: views, requests, events and errors

use std::sync::Arc;

use huddle_config::AppConfig;
use sqlx::SqlitePool;

pub mod hub;
pub mod read_model;
pub mod services;
pub mod storage;
pub mod types;
pub mod utils;

pub use hub::EventHub;
pub use services::{
    ChannelService, ConversationService, FileService, MemberService, MessageService,
    WorkspaceService,
};
pub use storage::FileStore;
pub use types::*;
pub use utils::{format_file_size, PermissionChecker, Validator};

/// Every workspace service wired to one pool and one event hub.
#[derive(Clone)]
pub struct WorkspaceServices {
    pub workspaces: Arc<WorkspaceService>,
    pub members: Arc<MemberService>,
    pub channels: Arc<ChannelService>,
    pub conversations: Arc<ConversationService>,
    pub messages: Arc<MessageService>,
    pub files: Arc<FileService>,
    pub hub: EventHub,
}

impl WorkspaceServices {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        Self::with_store(pool, config, FileStore::new(&config.storage.root))
    }

    pub fn with_store(pool: SqlitePool, config: &AppConfig, store: FileStore) -> Self {
        let hub = EventHub::new();
        let public_url = config.http.public_url.clone();

        Self {
            workspaces: Arc::new(WorkspaceService::new(pool.clone(), hub.clone())),
            members: Arc::new(MemberService::new(pool.clone(), hub.clone())),
            channels: Arc::new(ChannelService::new(pool.clone(), hub.clone())),
            conversations: Arc::new(ConversationService::new(pool.clone(), hub.clone())),
            messages: Arc::new(MessageService::new(
                pool.clone(),
                hub.clone(),
                config.messages.clone(),
                public_url.clone(),
            )),
            files: Arc::new(FileService::new(pool, store, public_url)),
            hub,
        }
    }
}
