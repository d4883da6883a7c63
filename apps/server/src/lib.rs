//! Composition of the Huddle server: router assembly and the data
//! maintenance commands behind the CLI.

pub mod data;

use axum::Router;
use huddle_config::AppConfig;
use huddle_gateway::{create_router, GatewayState};
use huddle_runtime::BackendServices;

/// Build the HTTP application from initialised services.
pub fn build_app(services: &BackendServices, config: &AppConfig) -> Router {
    let state = GatewayState::new(
        services.authenticator.clone(),
        services.workspaces.clone(),
        config.clone(),
    );
    create_router(state)
}
