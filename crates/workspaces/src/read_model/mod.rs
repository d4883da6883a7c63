//! Shaping stored rows into what clients render.

pub mod cursor;
pub mod reactions;
pub mod timeline;

pub use cursor::{decode_cursor, encode_cursor};
pub use reactions::group_reactions;
pub use timeline::{date_label, full_time_label, group_by_date, is_compact};
