use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::health::health_check,
        crate::rest::auth::register,
        crate::rest::auth::login,
        crate::rest::auth::github_login,
        crate::rest::auth::github_callback,
        crate::rest::auth::logout,
        crate::rest::auth::me,
        crate::rest::workspace::list_workspaces,
        crate::rest::workspace::create_workspace,
        crate::rest::workspace::get_workspace,
        crate::rest::workspace::get_workspace_info,
        crate::rest::workspace::update_workspace,
        crate::rest::workspace::delete_workspace,
        crate::rest::workspace::join_workspace,
        crate::rest::workspace::regenerate_join_code,
        crate::rest::member::current_member,
        crate::rest::member::list_members,
        crate::rest::member::get_member,
        crate::rest::member::update_member_role,
        crate::rest::member::remove_member,
        crate::rest::channel::list_channels,
        crate::rest::channel::create_channel,
        crate::rest::channel::get_channel,
        crate::rest::channel::update_channel,
        crate::rest::channel::delete_channel,
        crate::rest::conversation::list_conversations,
        crate::rest::conversation::create_conversation,
        crate::rest::conversation::get_conversation,
        crate::rest::message::list_messages,
        crate::rest::message::get_timeline,
        crate::rest::message::create_message,
        crate::rest::message::get_message,
        crate::rest::message::update_message,
        crate::rest::message::delete_message,
        crate::rest::message::toggle_reaction,
        crate::rest::file::upload_file,
        crate::rest::file::download_file,
        crate::websocket::websocket_handler
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::rest::health::HealthResponse,
            crate::rest::auth::RegisterRequest,
            crate::rest::auth::LoginRequest,
            crate::rest::auth::GithubLoginResponse,
            crate::rest::auth::GithubCallbackRequest,
            crate::rest::auth::SessionResponse,
            crate::rest::workspace::CreateWorkspaceRequest,
            crate::rest::workspace::UpdateWorkspaceRequest,
            crate::rest::workspace::JoinWorkspaceRequest,
            crate::rest::member::UpdateMemberRoleRequest,
            crate::rest::channel::ChannelRequest,
            crate::rest::conversation::CreateConversationRequest,
            crate::rest::message::UpdateMessageRequest,
            crate::rest::message::ToggleReactionRequest,
            huddle_workspaces::CreateMessageRequest,
            huddle_workspaces::UserView,
            huddle_workspaces::WorkspaceView,
            huddle_workspaces::WorkspaceInfo,
            huddle_workspaces::MemberView,
            huddle_workspaces::ChannelView,
            huddle_workspaces::ConversationView,
            huddle_workspaces::ConversationWithMember,
            huddle_workspaces::AttachmentView,
            huddle_workspaces::ReactionGroup,
            huddle_workspaces::ThreadView,
            huddle_workspaces::MessageView,
            huddle_workspaces::MessagePageView,
            huddle_workspaces::TimelineEntry,
            huddle_workspaces::DateGroup,
            huddle_workspaces::TimelineView,
            huddle_workspaces::ReactionToggle
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Accounts, sign-in and sessions"),
        (name = "Workspaces", description = "Workspace lifecycle and join codes"),
        (name = "Members", description = "Workspace membership and roles"),
        (name = "Channels", description = "Channels within a workspace"),
        (name = "Conversations", description = "Direct conversations between two members"),
        (name = "Messages", description = "Messages, threads, timelines and reactions"),
        (name = "Files", description = "Attachment upload and download"),
        (name = "Realtime", description = "Workspace event stream")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "bearer".to_string(),
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
