use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use huddle_database::DatabaseConnection;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and database are reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let database = DatabaseConnection::from_pool(state.authenticator().pool());
    let database_ok = match database.ping().await {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "health check could not reach the database");
            false
        }
    };

    let (status, label) = if database_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database: if database_ok { "up" } else { "down" }.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}
