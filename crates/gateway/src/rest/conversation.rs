//! Direct conversation REST endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use huddle_workspaces::ConversationWithMember;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    /// The other participant.
    pub member_id: String,
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/conversations",
    tag = "Conversations",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "The caller's conversations, newest first", body = Vec<ConversationWithMember>),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_conversations(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<Vec<ConversationWithMember>>> {
    let conversations = state
        .services()
        .conversations
        .list(&current.user, &workspace_id)
        .await?;
    Ok(Json(conversations))
}

/// Returns the existing conversation for the pair when there is one.
#[utoipa::path(
    post,
    path = "/api/workspaces/{workspace_id}/conversations",
    tag = "Conversations",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    request_body = CreateConversationRequest,
    responses(
        (status = 200, description = "Conversation with the other member", body = ConversationWithMember),
        (status = 404, description = "Member not found in this workspace", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_conversation(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
    Json(payload): Json<CreateConversationRequest>,
) -> GatewayResult<Json<ConversationWithMember>> {
    let conversation = state
        .services()
        .conversations
        .create_or_get(&current.user, &workspace_id, &payload.member_id)
        .await?;
    Ok(Json(conversation))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/conversations/{conversation_id}",
    tag = "Conversations",
    params(
        ("workspace_id" = String, Path, description = "Workspace public ID"),
        ("conversation_id" = String, Path, description = "Conversation public ID")
    ),
    responses(
        (status = 200, description = "Conversation with the other member", body = ConversationWithMember),
        (status = 403, description = "Participants only", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_conversation(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path((workspace_id, conversation_id)): Path<(String, String)>,
) -> GatewayResult<Json<ConversationWithMember>> {
    let conversation = state
        .services()
        .conversations
        .get(&current.user, &workspace_id, &conversation_id)
        .await?;
    Ok(Json(conversation))
}
