//! Member REST endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use huddle_database::MemberRole;
use huddle_workspaces::MemberView;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMemberRoleRequest {
    /// `admin` or `member`.
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/membership",
    tag = "Members",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "The caller's membership, or null", body = MemberView),
        (status = 404, description = "Workspace not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn current_member(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<Option<MemberView>>> {
    let member = state
        .services()
        .members
        .current(&current.user, &workspace_id)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/members",
    tag = "Members",
    params(("workspace_id" = String, Path, description = "Workspace public ID")),
    responses(
        (status = 200, description = "Members with their users", body = Vec<MemberView>),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_members(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(workspace_id): Path<String>,
) -> GatewayResult<Json<Vec<MemberView>>> {
    let members = state
        .services()
        .members
        .list(&current.user, &workspace_id)
        .await?;
    Ok(Json(members))
}

#[utoipa::path(
    get,
    path = "/api/workspaces/{workspace_id}/members/{member_id}",
    tag = "Members",
    params(
        ("workspace_id" = String, Path, description = "Workspace public ID"),
        ("member_id" = String, Path, description = "Member public ID")
    ),
    responses(
        (status = 200, description = "Member with user", body = MemberView),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_member(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path((workspace_id, member_id)): Path<(String, String)>,
) -> GatewayResult<Json<MemberView>> {
    let member = state
        .services()
        .members
        .get_by_id(&current.user, &workspace_id, &member_id)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    patch,
    path = "/api/members/{member_id}",
    tag = "Members",
    params(("member_id" = String, Path, description = "Member public ID")),
    request_body = UpdateMemberRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = MemberView),
        (status = 400, description = "Unknown role", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_member_role(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(member_id): Path<String>,
    Json(payload): Json<UpdateMemberRoleRequest>,
) -> GatewayResult<Json<MemberView>> {
    let role = MemberRole::parse(&payload.role)
        .ok_or_else(|| GatewayError::invalid(format!("Unknown role: {}", payload.role)))?;

    let member = state
        .services()
        .members
        .update_role(&current.user, &member_id, role)
        .await?;
    Ok(Json(member))
}

#[utoipa::path(
    delete,
    path = "/api/members/{member_id}",
    tag = "Members",
    params(("member_id" = String, Path, description = "Member public ID")),
    responses(
        (status = 204, description = "Member removed along with their content"),
        (status = 403, description = "Not allowed to remove this member", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn remove_member(
    State(state): State<GatewayState>,
    current: CurrentUser,
    Path(member_id): Path<String>,
) -> GatewayResult<StatusCode> {
    state
        .services()
        .members
        .remove(&current.user, &member_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
