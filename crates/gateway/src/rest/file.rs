//! Upload and download of message attachments.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use huddle_workspaces::{AttachmentView, Validator};
use tracing::debug;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

/// Largest accepted upload body: the document limit plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = 11 * 1024 * 1024;

const FILE_FIELD: &str = "file";

#[utoipa::path(
    post,
    path = "/api/files",
    tag = "Files",
    request_body(content = Vec<u8>, description = "Multipart form with a single `file` field", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored; reference it from a message by id", body = AttachmentView),
        (status = 400, description = "Missing or unsupported file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn upload_file(
    State(state): State<GatewayState>,
    current: CurrentUser,
    mut multipart: Multipart,
) -> GatewayResult<(StatusCode, Json<AttachmentView>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await?;
        debug!(file_name = %file_name, bytes = data.len(), "received upload");

        let attachment = state
            .services()
            .files
            .upload(&current.user, &file_name, &content_type, data)
            .await?;
        return Ok((StatusCode::CREATED, Json(attachment)));
    }

    Err(GatewayError::invalid("Missing `file` field"))
}

#[utoipa::path(
    get,
    path = "/api/files/{file_id}",
    tag = "Files",
    params(("file_id" = String, Path, description = "Storage id returned by the upload")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<GatewayState>,
    Path(file_id): Path<String>,
) -> GatewayResult<(HeaderMap, bytes::Bytes)> {
    let (file, data) = state.services().files.download(&file_id).await?;

    let content_type = Validator::stored_content_type(&file.file_name, &file.content_type);
    let inline = Validator::renders_inline(content_type);

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    if let Ok(disposition) = HeaderValue::from_str(&content_disposition(&file.file_name, inline)) {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok((headers, data))
}

/// Only raster images are shown in place; everything else downloads.
fn content_disposition(file_name: &str, inline: bool) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let kind = if inline { "inline" } else { "attachment" };
    format!("{kind}; filename=\"{safe}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_strips_quotes_and_control_characters() {
        assert_eq!(
            content_disposition("re\"port\n.pdf", false),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition("cat.png", true),
            "inline; filename=\"cat.png\""
        );
    }
}
