//! Message REST endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use huddle_workspaces::{
    CreateMessageRequest, MessagePageView, MessageQuery, MessageView, ReactionToggle, TimelineView,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleReactionRequest {
    pub emoji: String,
}

#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "One page of messages, newest first", body = MessagePageView),
        (status = 400, description = "Bad filter combination or cursor", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_messages(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Query(query): Query<MessageQuery>,
) -> GatewayResult<Json<MessagePageView>> {
    let page = state.services().messages.list(&current.user, query).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/timeline",
    tag = "Messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "One page of messages grouped by day", body = TimelineView),
        (status = 400, description = "Bad filter combination or cursor", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_timeline(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Query(query): Query<MessageQuery>,
) -> GatewayResult<Json<TimelineView>> {
    let timeline = state
        .services()
        .messages
        .timeline(&current.user, query)
        .await?;
    Ok(Json(timeline))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = MessageView),
        (status = 400, description = "Missing content or bad target", body = ErrorResponse),
        (status = 403, description = "Not a member or participant", body = ErrorResponse),
        (status = 413, description = "Attachments too large", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_message(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Json(payload): Json<CreateMessageRequest>,
) -> GatewayResult<(StatusCode, Json<MessageView>)> {
    let message = state
        .services()
        .messages
        .create(&current.user, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    get,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    params(("message_id" = String, Path, description = "Message public ID")),
    responses(
        (status = 200, description = "Message details", body = MessageView),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_message(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(message_id): Path<String>,
) -> GatewayResult<Json<MessageView>> {
    let message = state
        .services()
        .messages
        .get(&current.user, &message_id)
        .await?;
    Ok(Json(message))
}

#[utoipa::path(
    patch,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    params(("message_id" = String, Path, description = "Message public ID")),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Message edited", body = MessageView),
        (status = 403, description = "Authors only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_message(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(message_id): Path<String>,
    Json(payload): Json<UpdateMessageRequest>,
) -> GatewayResult<Json<MessageView>> {
    let message = state
        .services()
        .messages
        .update(&current.user, &message_id, &payload.text)
        .await?;
    Ok(Json(message))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    params(("message_id" = String, Path, description = "Message public ID")),
    responses(
        (status = 204, description = "Message, replies and reactions deleted"),
        (status = 403, description = "Authors only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_message(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(message_id): Path<String>,
) -> GatewayResult<StatusCode> {
    state
        .services()
        .messages
        .delete(&current.user, &message_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/messages/{message_id}/reactions",
    tag = "Messages",
    params(("message_id" = String, Path, description = "Message public ID")),
    request_body = ToggleReactionRequest,
    responses(
        (status = 200, description = "Reaction added or removed", body = ReactionToggle),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn toggle_reaction(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(message_id): Path<String>,
    Json(payload): Json<ToggleReactionRequest>,
) -> GatewayResult<Json<ReactionToggle>> {
    let toggle = state
        .services()
        .messages
        .toggle_reaction(&current.user, &message_id, &payload.emoji)
        .await?;
    Ok(Json(toggle))
}
