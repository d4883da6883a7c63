//! Authentication, access logging, tracing and CORS.

use std::time::Instant;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use huddle_database::User;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn, Level};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// The signed-in caller, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| GatewayError::unauthenticated("User not authenticated"))
    }
}

/// Reject requests without a valid bearer session.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = require_bearer(request.headers())?;
    let (user, _session) = state.authenticate(&token).await?;

    debug!(user_id = %user.public_id, "authenticated request");
    request.extensions_mut().insert(CurrentUser { user, token });

    Ok(next.run(request).await)
}

pub fn require_bearer(headers: &HeaderMap) -> GatewayResult<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| GatewayError::unauthenticated("Missing authorization header"))?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(GatewayError::unauthenticated("Invalid authorization scheme"));
    }

    match parts.next() {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(GatewayError::unauthenticated("Missing bearer token")),
    }
}

pub fn create_trace_middleware() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG))
}

pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Any origin when none are configured; unparsable origins are skipped.
pub fn create_cors_middleware(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
