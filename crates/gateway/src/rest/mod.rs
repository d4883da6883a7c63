//! REST API endpoints for the gateway

pub mod auth;
pub mod channel;
pub mod conversation;
pub mod file;
pub mod health;
pub mod member;
pub mod message;
pub mod workspace;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth_middleware;
use crate::state::GatewayState;

/// Routes reachable without a session.
pub fn create_public_routes() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/github/login", get(auth::github_login))
        .route("/api/auth/github/callback", post(auth::github_callback))
        .route("/api/files/:file_id", get(file::download_file))
}

/// Routes behind [`auth_middleware`].
pub fn create_protected_routes(state: GatewayState) -> Router<GatewayState> {
    Router::new()
        // Session
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Workspaces
        .route(
            "/api/workspaces",
            get(workspace::list_workspaces).post(workspace::create_workspace),
        )
        .route(
            "/api/workspaces/:workspace_id",
            get(workspace::get_workspace)
                .patch(workspace::update_workspace)
                .delete(workspace::delete_workspace),
        )
        .route(
            "/api/workspaces/:workspace_id/info",
            get(workspace::get_workspace_info),
        )
        .route(
            "/api/workspaces/:workspace_id/join",
            post(workspace::join_workspace),
        )
        .route(
            "/api/workspaces/:workspace_id/join-code",
            post(workspace::regenerate_join_code),
        )
        // Members
        .route(
            "/api/workspaces/:workspace_id/membership",
            get(member::current_member),
        )
        .route(
            "/api/workspaces/:workspace_id/members",
            get(member::list_members),
        )
        .route(
            "/api/workspaces/:workspace_id/members/:member_id",
            get(member::get_member),
        )
        .route(
            "/api/members/:member_id",
            axum::routing::patch(member::update_member_role).delete(member::remove_member),
        )
        // Channels
        .route(
            "/api/workspaces/:workspace_id/channels",
            get(channel::list_channels).post(channel::create_channel),
        )
        .route(
            "/api/workspaces/:workspace_id/channels/:channel_id",
            get(channel::get_channel)
                .patch(channel::update_channel)
                .delete(channel::delete_channel),
        )
        // Conversations
        .route(
            "/api/workspaces/:workspace_id/conversations",
            get(conversation::list_conversations).post(conversation::create_conversation),
        )
        .route(
            "/api/workspaces/:workspace_id/conversations/:conversation_id",
            get(conversation::get_conversation),
        )
        // Messages
        .route(
            "/api/messages",
            get(message::list_messages).post(message::create_message),
        )
        .route("/api/timeline", get(message::get_timeline))
        .route(
            "/api/messages/:message_id",
            get(message::get_message)
                .patch(message::update_message)
                .delete(message::delete_message),
        )
        .route(
            "/api/messages/:message_id/reactions",
            post(message::toggle_reaction),
        )
        // Files
        .route(
            "/api/files",
            post(file::upload_file).layer(DefaultBodyLimit::max(file::UPLOAD_BODY_LIMIT)),
        )
        .route_layer(from_fn_with_state(state, auth_middleware))
}
