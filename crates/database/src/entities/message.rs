use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row};

use super::{optional_timestamp, timestamp};
use crate::types::DatabaseResult;

/// A message posted to a channel, a conversation, or a thread.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub workspace_id: i64,
    #[serde(skip_serializing)]
    pub member_id: i64,
    #[serde(skip_serializing)]
    pub channel_id: Option<i64>,
    #[serde(skip_serializing)]
    pub conversation_id: Option<i64>,
    #[serde(skip_serializing)]
    pub parent_message_id: Option<i64>,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload for [`Message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub workspace_id: i64,
    pub member_id: i64,
    pub channel_id: Option<i64>,
    pub conversation_id: Option<i64>,
    pub parent_message_id: Option<i64>,
    pub text: Option<String>,
}

/// Which message list a page is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScope {
    /// Top-level messages of a channel.
    Channel(i64),
    /// Top-level messages of a conversation.
    Conversation(i64),
    /// Replies under a parent message.
    Thread(i64),
}

impl MessageScope {
    pub(crate) fn filter(&self) -> (&'static str, i64) {
        match *self {
            MessageScope::Channel(id) => ("channel_id = ? AND parent_message_id IS NULL", id),
            MessageScope::Conversation(id) => {
                ("conversation_id = ? AND parent_message_id IS NULL", id)
            }
            MessageScope::Thread(id) => ("parent_message_id = ?", id),
        }
    }
}

/// Aggregate over the replies to one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSummary {
    pub count: i64,
    pub last_reply_at: Option<DateTime<Utc>>,
    pub last_reply_member_id: Option<i64>,
}

impl Message {
    pub(crate) const COLUMNS: &'static str = "id, public_id, workspace_id, member_id, channel_id, \
         conversation_id, parent_message_id, text, created_at, updated_at";

    pub(crate) fn from_row(row: &SqliteRow) -> DatabaseResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            workspace_id: row.try_get("workspace_id")?,
            member_id: row.try_get("member_id")?,
            channel_id: row.try_get("channel_id")?,
            conversation_id: row.try_get("conversation_id")?,
            parent_message_id: row.try_get("parent_message_id")?,
            text: row.try_get("text")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: optional_timestamp(row, "updated_at")?,
        })
    }

    pub fn is_thread_reply(&self) -> bool {
        self.parent_message_id.is_some()
    }
}
