//! Inputs for message operations.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub workspace_id: String,
    pub text: Option<String>,
    /// Storage ids returned by the upload endpoint, in display order.
    #[serde(default)]
    pub files: Vec<String>,
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
}

/// Which messages to list. Exactly one of `channel_id`,
/// `conversation_id` or `parent_message_id` must be set.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub workspace_id: String,
    pub channel_id: Option<String>,
    pub conversation_id: Option<String>,
    pub parent_message_id: Option<String>,
    /// `continue_cursor` from the previous page.
    pub cursor: Option<String>,
    pub num_items: Option<u32>,
}
