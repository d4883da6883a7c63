//! Validation utilities.

use huddle_database::FileKind;
use once_cell::sync::OnceCell;
use rand::{distributions::Uniform, Rng};
use regex::Regex;

use crate::types::{WorkspaceError, WorkspaceResult};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const MESSAGE_MAX_CHARS: usize = 100_000;
pub const EMOJI_MAX_CHARS: usize = 32;

pub const JOIN_CODE_LENGTH: usize = 6;
const JOIN_CODE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const MAX_FILES_PER_MESSAGE: usize = 5;
pub const MAX_TOTAL_FILE_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];
const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf"];
const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "application/rtf",
];

/// Served type per known extension. Uploads never choose their own type.
const EXTENSION_CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("rtf", "application/rtf"),
];

/// Raster formats browsers render without running script.
const INLINE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

static WHITESPACE: OnceCell<Regex> = OnceCell::new();

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate a workspace name, returning it trimmed.
    pub fn workspace_name(name: &str) -> WorkspaceResult<String> {
        let name = name.trim();
        Self::name_length(name, "Workspace name")?;
        Ok(name.to_string())
    }

    /// Normalise a channel name: lowercase, whitespace runs become `-`.
    pub fn channel_name(name: &str) -> WorkspaceResult<String> {
        let whitespace = WHITESPACE
            .get_or_try_init(|| Regex::new(r"\s+"))
            .map_err(|e| WorkspaceError::invalid(format!("channel name pattern: {e}")))?;

        let normalized = whitespace
            .replace_all(name.trim(), "-")
            .to_lowercase();
        Self::name_length(&normalized, "Channel name")?;
        Ok(normalized)
    }

    fn name_length(name: &str, what: &str) -> WorkspaceResult<()> {
        let chars = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
            return Err(WorkspaceError::invalid(format!(
                "{what} must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
            )));
        }
        Ok(())
    }

    /// Blank descriptions are stored as absent.
    pub fn description(description: Option<&str>) -> WorkspaceResult<Option<String>> {
        let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(None);
        };

        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(WorkspaceError::invalid(format!(
                "Description too long (max {DESCRIPTION_MAX_CHARS} characters)"
            )));
        }
        Ok(Some(description.to_string()))
    }

    pub fn image_url(image_url: Option<&str>) -> WorkspaceResult<Option<String>> {
        let Some(url) = image_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Ok(None);
        };

        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/')) {
            return Err(WorkspaceError::invalid("Image URL must be an http(s) URL"));
        }
        Ok(Some(url.to_string()))
    }

    /// Message bodies keep their formatting; only all-blank text counts as absent.
    pub fn message_text(text: Option<&str>) -> WorkspaceResult<Option<String>> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(None);
        };

        if text.chars().count() > MESSAGE_MAX_CHARS {
            return Err(WorkspaceError::invalid(
                "Message content too long (max 100,000 characters)",
            ));
        }
        Ok(Some(text.to_string()))
    }

    pub fn emoji(emoji: &str) -> WorkspaceResult<String> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(WorkspaceError::invalid("Emoji cannot be empty"));
        }
        if emoji.chars().count() > EMOJI_MAX_CHARS {
            return Err(WorkspaceError::invalid("Emoji too long"));
        }
        Ok(emoji.to_string())
    }

    pub fn generate_join_code() -> String {
        let alphabet = Uniform::from(0..JOIN_CODE_ALPHABET.len());
        rand::thread_rng()
            .sample_iter(alphabet)
            .take(JOIN_CODE_LENGTH)
            .map(|i| char::from(JOIN_CODE_ALPHABET[i]))
            .collect()
    }

    pub fn join_code_matches(expected: &str, provided: &str) -> bool {
        expected.eq_ignore_ascii_case(provided.trim())
    }

    /// Decide whether a file is an image or a document. The extension and
    /// the declared MIME type are each sufficient.
    pub fn classify_file(file_name: &str, content_type: &str) -> Option<FileKind> {
        let extension = extension(file_name);
        let mime = content_type.trim().to_ascii_lowercase();

        if IMAGE_EXTENSIONS.contains(&extension.as_str()) || IMAGE_MIME_TYPES.contains(&mime.as_str()) {
            Some(FileKind::Image)
        } else if DOCUMENT_EXTENSIONS.contains(&extension.as_str())
            || DOCUMENT_MIME_TYPES.contains(&mime.as_str())
        {
            Some(FileKind::Document)
        } else {
            None
        }
    }

    /// Content type recorded for an upload: the extension's type when the
    /// extension is known, else the declared type if it is allow-listed,
    /// else `application/octet-stream`.
    pub fn stored_content_type(file_name: &str, declared: &str) -> &'static str {
        let extension = extension(file_name);
        if let Some((_, mime)) = EXTENSION_CONTENT_TYPES
            .iter()
            .find(|(ext, _)| *ext == extension)
        {
            return *mime;
        }

        let declared = declared.trim().to_ascii_lowercase();
        IMAGE_MIME_TYPES
            .iter()
            .chain(DOCUMENT_MIME_TYPES)
            .find(|mime| **mime == declared)
            .copied()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
    }

    /// Whether a stored type may be shown in the browser rather than
    /// downloaded.
    pub fn renders_inline(content_type: &str) -> bool {
        INLINE_CONTENT_TYPES.contains(&content_type)
    }

    pub fn max_bytes(kind: FileKind) -> u64 {
        match kind {
            FileKind::Image => MAX_IMAGE_BYTES,
            FileKind::Document => MAX_DOCUMENT_BYTES,
        }
    }

    /// Validate a single upload and return its kind.
    pub fn file(file_name: &str, content_type: &str, size: u64) -> WorkspaceResult<FileKind> {
        if file_name.trim().is_empty() {
            return Err(WorkspaceError::invalid("File name cannot be empty"));
        }
        if file_name.len() > 255 {
            return Err(WorkspaceError::invalid(
                "File name too long (max 255 characters)",
            ));
        }
        if size == 0 {
            return Err(WorkspaceError::invalid("File cannot be empty"));
        }

        let kind = Self::classify_file(file_name, content_type)
            .ok_or_else(|| WorkspaceError::invalid("Unsupported file type"))?;

        let limit = Self::max_bytes(kind);
        if size > limit {
            return Err(WorkspaceError::too_large(format!(
                "File too large. Max size: {}",
                format_file_size(limit)
            )));
        }

        Ok(kind)
    }

    /// Limits on the set of files attached to one message.
    pub fn attachment_set(count: usize, total_bytes: u64) -> WorkspaceResult<()> {
        if count > MAX_FILES_PER_MESSAGE {
            return Err(WorkspaceError::invalid(format!(
                "Maximum {MAX_FILES_PER_MESSAGE} files allowed"
            )));
        }
        if total_bytes > MAX_TOTAL_FILE_BYTES {
            return Err(WorkspaceError::too_large(format!(
                "Total file size exceeds {}",
                format_file_size(MAX_TOTAL_FILE_BYTES)
            )));
        }
        Ok(())
    }
}

/// Human-readable byte count: `0 Bytes`, `1.5 KB`, `5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / scale as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{value} {}", UNITS[unit])
}
