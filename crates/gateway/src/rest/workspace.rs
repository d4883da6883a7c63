//! Workspace REST endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use huddle_workspaces::{MemberView, WorkspaceInfo, WorkspaceView};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWorkspaceRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinWorkspaceRequest {
    pub join_code: String,
}

#[utoipa::path(
    get,
    path = "/api/workspaces",
    tag = "Workspaces",
    responses(
        (status = 200, description = "Workspaces the caller belongs to, newest first", body = Vec<WorkspaceView>),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_workspaces(
    State(state): State<GatewayState>,
    current: CurrentUser,
) -> GatewayResult<Json<Vec<WorkspaceView>>> {
    let workspaces = state.services().workspaces.list(&current.user).await?;
    Ok(Json(workspaces))
}

#[utoipa::path(
    post,
    path = "/api/workspaces",
    tag = "Workspaces",
    request_body = CreateWorkspaceRequest,
    responses(
        (status = 201, description = "Workspace created with the caller as admin", body = WorkspaceView),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_workspace(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Json(payload): Json<CreateWorkspaceRequest>,
) -> GatewayResult<(StatusCode, Json<WorkspaceView>)> {
    let workspace = state
        .services()
        .workspaces
        .create(&current.user, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "Workspace details", body = WorkspaceView),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Workspace not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_workspace(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<WorkspaceView>> {
    let workspace = state
        .services()
        .workspaces
        .get_by_id(&current.user, &workspace_id)
        .await?;
    Ok(Json(workspace))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/info",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "Public summary for the join page", body = WorkspaceInfo),
        (status = 404, description = "Workspace not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_workspace_info(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<WorkspaceInfo>> {
    let info = state
        .services()
        .workspaces
        .get_info(&current.user, &workspace_id)
        .await?;
    Ok(Json(info))
}

#[utoipa::path(
    patch,
    path = "/api/workspaces/{workspace_id}",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    request_body = UpdateWorkspaceRequest,
    responses(
        (status = 200, description = "Workspace updated", body = WorkspaceView),
        (status = 400, description = "Invalid name or image URL", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_workspace(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
    Json(payload): Json<UpdateWorkspaceRequest>,
) -> GatewayResult<Json<WorkspaceView>> {
    let workspace = state
        .services()
        .workspaces
        .update(
            &current.user,
            &workspace_id,
            &payload.name,
            payload.image_url.as_deref(),
        )
        .await?;
    Ok(Json(workspace))
}

#[utoipa::path(
    delete,
    path = "/api/workspaces/{workspace_id}",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 204, description = "Workspace and all of its content deleted"),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_workspace(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<StatusCode> {
    state
        .services()
        .workspaces
        .delete(&current.user, &workspace_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/workspaces/{workspace_id}/join",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    request_body = JoinWorkspaceRequest,
    responses(
        (status = 201, description = "Joined as member", body = MemberView),
        (status = 400, description = "Invalid join code", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn join_workspace(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
    Json(payload): Json<JoinWorkspaceRequest>,
) -> GatewayResult<(StatusCode, Json<MemberView>)> {
    let member = state
        .services()
        .workspaces
        .join(&current.user, &workspace_id, &payload.join_code)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    post,
    path = "/api/workspaces/{workspace_id}/join-code",
    tag = "Workspaces",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "Workspace with a fresh join code", body = WorkspaceView),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn regenerate_join_code(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<WorkspaceView>> {
    let workspace = state
        .services()
        .workspaces
        .regenerate_join_code(&current.user, &workspace_id)
        .await?;
    Ok(Json(workspace))
}
