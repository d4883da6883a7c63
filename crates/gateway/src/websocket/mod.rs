//! Live workspace events over WebSocket.
//!
//! A client connects to `/ws?workspace_id=..&token=..`. The token is
//! checked like a bearer header and the caller must be a member of the
//! workspace. Every [`huddle_workspaces::EventEnvelope`] published for the
//! workspace is then pushed as a JSON text frame, except events restricted
//! to an audience the member is not part of. A text frame `ping` is
//! answered with `pong`.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use huddle_workspaces::EventEnvelope;
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use utoipa::IntoParams;

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WebSocketQuery {
    pub workspace_id: String,
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/ws",
    tag = "Realtime",
    params(WebSocketQuery),
    responses(
        (status = 101, description = "Switching to the event stream"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a member of the workspace", body = crate::error::ErrorResponse)
    )
)]
pub async fn websocket_handler(
    Query(params): Query<WebSocketQuery>,
    State(state): State<GatewayState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> GatewayResult<Response> {
    // Credentials are judged before the handshake itself.
    let token = params
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| GatewayError::unauthenticated("Missing authentication token"))?;
    let (user, _session) = state.authenticate(&token).await?;

    let member = state
        .services()
        .members
        .current(&user, &params.workspace_id)
        .await?
        .ok_or_else(|| GatewayError::Forbidden("Unauthorized".to_string()))?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    // Subscribe before upgrading so nothing published in between is lost.
    let events = state.services().hub.subscribe(&params.workspace_id).await;
    let workspace_id = params.workspace_id;

    info!(
        workspace_id = %workspace_id,
        member_id = %member.id,
        "websocket subscription opened"
    );

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, events, workspace_id, member.id)))
}

async fn handle_socket(
    socket: WebSocket,
    mut events: broadcast::Receiver<Arc<EventEnvelope>>,
    workspace_id: String,
    member_id: String,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) if text.trim() == "ping" => {
                    if sender.send(Message::Text("pong".to_string())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    debug!(error = %err, "websocket receive failed");
                    break;
                }
                // Other client frames carry no meaning here.
                Some(Ok(_)) => {}
            },
            event = events.recv() => match event {
                Ok(envelope) => {
                    if !envelope.visible_to(&member_id) {
                        continue;
                    }

                    match serde_json::to_string(envelope.as_ref()) {
                        Ok(json) => {
                            if sender.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(error = %err, "failed to serialize workspace event"),
                    }

                    if envelope.ends_subscription_for(&member_id) {
                        let _ = sender.send(Message::Close(None)).await;
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(workspace_id = %workspace_id, skipped, "websocket subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
        }
    }

    info!(
        workspace_id = %workspace_id,
        member_id = %member_id,
        "websocket subscription closed"
    );
}
