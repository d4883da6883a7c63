//! Row types stored in the database.
//!
//! Every entity carries an internal integer primary key plus a public id
//! (cuid2 for most tables, a UUID for stored files) that is the only
//! identifier handed out over the API.

pub mod channel;
pub mod conversation;
pub mod file;
pub mod member;
pub mod message;
pub mod reaction;
pub mod user;
pub mod workspace;

pub use channel::Channel;
pub use conversation::Conversation;
pub use file::{FileKind, NewStoredFile, StoredFile};
pub use member::{MemberRole, MemberWithUser, WorkspaceMember};
pub use message::{Message, MessageScope, NewMessage, ThreadSummary};
pub use reaction::Reaction;
pub use user::User;
pub use workspace::Workspace;

use chrono::{DateTime, SecondsFormat, Utc};
use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::{sqlite::SqliteRow, Row};

use crate::types::{DatabaseError, DatabaseResult};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate a new public identifier.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Current time plus its stored text form.
pub(crate) fn now() -> (DateTime<Utc>, String) {
    let now = Utc::now();
    let text = format_timestamp(&now);
    (now, text)
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(value: &str) -> DatabaseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidData(format!("bad timestamp {value:?}: {e}")))
}

pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> DatabaseResult<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw)
}

pub(crate) fn optional_timestamp(
    row: &SqliteRow,
    column: &str,
) -> DatabaseResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.as_deref().map(parse_timestamp).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_through_text() {
        let (now, text) = now();
        let parsed = parse_timestamp(&text).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }

    #[test]
    fn malformed_timestamps_are_rejected() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(DatabaseError::InvalidData(_))
        ));
    }

    #[test]
    fn public_ids_are_unique() {
        assert_ne!(new_public_id(), new_public_id());
    }
}
