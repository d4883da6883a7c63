//! # Huddle Gateway Crate
//!
//! HTTP and WebSocket surface of the team chat backend. Handlers stay thin:
//! they authenticate the caller, hand the request to the matching
//! [`huddle_workspaces`] service and map its errors to status codes.
//!
//! ## Architecture
//!
//! - **REST**: JSON endpoints under `/api` with OpenAPI documentation
//! - **WebSocket**: per-workspace event stream at `/ws`
//! - **State**: authenticator, services and OAuth state shared by handlers
//! - **Middleware**: bearer authentication, access logging, tracing and CORS

pub mod docs;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use docs::ApiDoc;
pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use middleware::{auth_middleware, CurrentUser};
pub use state::{GatewayState, OAuthStateStore};

use axum::{middleware as axum_middleware, routing::get, Router};

/// Create the application router with every route and layer attached.
pub fn create_router(state: GatewayState) -> Router {
    let cors = middleware::create_cors_middleware(&state.config().http.cors_origins);

    #[allow(unused_mut)]
    let mut router = Router::new()
        .merge(rest::create_public_routes())
        .merge(rest::create_protected_routes(state.clone()))
        .route("/ws", get(websocket::websocket_handler));

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::create_trace_middleware())
        .layer(cors)
}
