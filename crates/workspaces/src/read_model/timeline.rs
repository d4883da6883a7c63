//! Date grouping and compaction for message lists.
//!
//! All calendar math happens in UTC.

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::types::{DateGroup, MessageView, TimelineEntry};

/// Consecutive messages by the same person closer than this collapse
/// their header.
pub const COMPACT_WINDOW_MINUTES: i64 = 5;

pub fn date_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// `Today`, `Yesterday`, else `Month D, YYYY`.
pub fn date_label(date: NaiveDate, now: &DateTime<Utc>) -> String {
    match relative_day(date, now) {
        Some(label) => label.to_string(),
        None => date.format("%B %-d, %Y").to_string(),
    }
}

/// `Today`, `Yesterday`, else `MMM D, YYYY at h:mm:ss a`.
pub fn full_time_label(at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    match relative_day(at.date_naive(), now) {
        Some(label) => label.to_string(),
        None => at.format("%b %-d, %Y at %-I:%M:%S %P").to_string(),
    }
}

fn relative_day(date: NaiveDate, now: &DateTime<Utc>) -> Option<&'static str> {
    let today = now.date_naive();
    if date == today {
        Some("Today")
    } else if today.checked_sub_days(Days::new(1)) == Some(date) {
        Some("Yesterday")
    } else {
        None
    }
}

/// Whether `message` can hide its author header because `previous` (the
/// chronologically earlier neighbour) was posted by the same user just
/// before it.
pub fn is_compact(message: &MessageView, previous: Option<&MessageView>) -> bool {
    let Some(previous) = previous else {
        return false;
    };

    if date_key(&message.created_at) != date_key(&previous.created_at) {
        return false;
    }
    if message.member.user.id != previous.member.user.id {
        return false;
    }

    let gap = message.created_at - previous.created_at;
    gap.num_minutes().abs() < COMPACT_WINDOW_MINUTES
}

/// Group newest-first messages by calendar day, in order of first appearance.
///
/// `older` is the message just past the end of the page; without it the
/// last entry always keeps its header.
pub fn group_by_date(
    messages: Vec<MessageView>,
    older: Option<&MessageView>,
    now: &DateTime<Utc>,
) -> Vec<DateGroup> {
    let compact: Vec<bool> = messages
        .iter()
        .enumerate()
        .map(|(i, message)| is_compact(message, messages.get(i + 1).or(older)))
        .collect();

    let mut groups: Vec<DateGroup> = Vec::new();

    for (message, is_compact) in messages.into_iter().zip(compact) {
        let key = date_key(&message.created_at);
        let entry = TimelineEntry {
            time_label: full_time_label(&message.created_at, now),
            is_compact,
            message,
        };

        match groups.iter_mut().find(|g| g.date == key) {
            Some(group) => group.messages.push(entry),
            None => groups.push(DateGroup {
                label: date_label(entry.message.created_at.date_naive(), now),
                date: key,
                messages: vec![entry],
            }),
        }
    }

    groups
}
