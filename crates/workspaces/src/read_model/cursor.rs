//! Opaque pagination cursors.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::types::{WorkspaceError, WorkspaceResult};

/// Encode the position of the last entry handed out.
pub fn encode_cursor(position: i64) -> String {
    URL_SAFE_NO_PAD.encode(position.to_string())
}

pub fn decode_cursor(cursor: &str) -> WorkspaceResult<i64> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.trim())
        .map_err(|_| WorkspaceError::invalid("malformed cursor"))?;

    std::str::from_utf8(&bytes)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .filter(|position| *position > 0)
        .ok_or_else(|| WorkspaceError::invalid("malformed cursor"))
}
