//! Channel REST endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use huddle_workspaces::ChannelView;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChannelRequest {
    pub name: String,
    pub description: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/channels",
    tag = "Channels",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "Channels, newest first; empty for non-members", body = Vec<ChannelView>)
    ),
    security(("bearer" = []))
)]
pub async fn list_channels(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<Vec<ChannelView>>> {
    let channels = state
        .services()
        .channels
        .list(&current.user, &workspace_id)
        .await?;
    Ok(Json(channels))
}

#[utoipa::path(
    post,
    path = "/api/workspaces/{workspace_id}/channels",
    tag = "Channels",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    request_body = ChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = ChannelView),
        (status = 400, description = "Invalid name", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_channel(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
    Json(payload): Json<ChannelRequest>,
) -> GatewayResult<(StatusCode, Json<ChannelView>)> {
    let channel = state
        .services()
        .channels
        .create(
            &current.user,
            &workspace_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/channels/{channel_id}",
    tag = "Channels",
    params(
        ("workspace_id" = String, Path, description = "Workspace public ID"),
        ("channel_id" = String, Path, description = "Channel public ID")
    ),
    responses(
        (status = 200, description = "Channel details", body = ChannelView),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Channel not found in this workspace", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_channel(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path((workspace_id, channel_id)): Path<(String, String)>,
) -> GatewayResult<Json<ChannelView>> {
    let channel = state
        .services()
        .channels
        .get(&current.user, &workspace_id, &channel_id)
        .await?;
    Ok(Json(channel))
}

#[utoipa::path(
    patch,
    path = "/api/workspaces/{workspace_id}/channels/{channel_id}",
    tag = "Channels",
    params(
        ("workspace_id" = String, Path, description = "Workspace public ID"),
        ("channel_id" = String, Path, description = "Channel public ID")
    ),
    request_body = ChannelRequest,
    responses(
        (status = 200, description = "Channel updated", body = ChannelView),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_channel(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path((workspace_id, channel_id)): Path<(String, String)>,
    Json(payload): Json<ChannelRequest>,
) -> GatewayResult<Json<ChannelView>> {
    let channel = state
        .services()
        .channels
        .update(
            &current.user,
            &workspace_id,
            &channel_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await?;
    Ok(Json(channel))
}

#[utoipa::path(
    delete,
    path = "/api/workspaces/{workspace_id}/channels/{channel_id}",
    tag = "Channels",
    params(
        ("workspace_id" = String, Path, description = "Workspace public ID"),
        ("channel_id" = String, Path, description = "Channel public ID")
    ),
    responses(
        (status = 204, description = "Channel and its messages deleted"),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_channel(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path((workspace_id, channel_id)): Path<(String, String)>,
) -> GatewayResult<StatusCode> {
    state
        .services()
        .channels
        .delete(&current.user, &workspace_id, &channel_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
