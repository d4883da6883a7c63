//! Sign-in, sign-up and session endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use huddle_auth::AuthSession;
use huddle_database::User;
use huddle_workspaces::UserView;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GithubLoginResponse {
    pub authorize_url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GithubLoginQuery {
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GithubCallbackRequest {
    pub code: String,
    pub state: String,
    pub redirect_uri: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserView,
    pub expires_at: String,
}

impl SessionResponse {
    pub fn new(session: AuthSession, user: &User) -> Self {
        Self {
            token: session.token,
            user: UserView::from(user),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

async fn session_response(state: &GatewayState, session: AuthSession) -> GatewayResult<SessionResponse> {
    let user = state.authenticator().user_profile(session.user_id).await?;
    Ok(SessionResponse::new(session, &user))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<GatewayState>,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<(StatusCode, Json<SessionResponse>)> {
    let user = state
        .authenticator()
        .register_with_password(&payload.email, &payload.password, payload.display_name.as_deref())
        .await?;
    info!(user_id = %user.public_id, "user registered");

    let session = state
        .authenticator()
        .login_with_password(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::new(session, &user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<GatewayState>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    let session = state
        .authenticator()
        .login_with_password(&payload.email, &payload.password)
        .await?;

    Ok(Json(session_response(&state, session).await?))
}

#[utoipa::path(
    get,
    path = "/api/auth/github/login",
    tag = "Auth",
    params(GithubLoginQuery),
    responses(
        (status = 200, description = "GitHub OAuth authorization URL", body = GithubLoginResponse),
        (status = 503, description = "GitHub OAuth not configured", body = ErrorResponse)
    )
)]
pub async fn github_login(
    State(state): State<GatewayState>,
    Query(params): Query<GithubLoginQuery>,
) -> GatewayResult<Json<GithubLoginResponse>> {
    if !state.authenticator().github_enabled() {
        return Err(huddle_auth::AuthError::GithubOauthDisabled.into());
    }

    let oauth_state = state.oauth_state().issue().await;
    let authorize_url = state
        .authenticator()
        .github_authorization_url(&oauth_state, &params.redirect_uri)?;

    Ok(Json(GithubLoginResponse { authorize_url }))
}

#[utoipa::path(
    post,
    path = "/api/auth/github/callback",
    tag = "Auth",
    request_body = GithubCallbackRequest,
    responses(
        (status = 200, description = "GitHub OAuth callback succeeded", body = SessionResponse),
        (status = 400, description = "Unknown or expired OAuth state", body = ErrorResponse),
        (status = 502, description = "GitHub rejected the code", body = ErrorResponse),
        (status = 503, description = "GitHub OAuth not configured", body = ErrorResponse)
    )
)]
pub async fn github_callback(
    State(state): State<GatewayState>,
    Json(payload): Json<GithubCallbackRequest>,
) -> GatewayResult<Json<SessionResponse>> {
    if !state.oauth_state().consume(&payload.state).await {
        return Err(GatewayError::invalid("Invalid OAuth state"));
    }

    let session = state
        .authenticator()
        .login_with_github_code(&payload.code, &payload.redirect_uri)
        .await?;

    Ok(Json(session_response(&state, session).await?))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn logout(
    State(state): State<GatewayState>,
    current: CurrentUser,
) -> GatewayResult<StatusCode> {
    state.authenticator().logout(&current.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The signed-in user", body = UserView),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn me(current: CurrentUser) -> Json<UserView> {
    Json(UserView::from(&current.user))
}
