//! Error types for the gateway layer

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use huddle_auth::AuthError;
use huddle_workspaces::WorkspaceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Numeric HTTP status as a string, e.g. `"404"`.
    pub error: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl GatewayError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.as_str().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<WorkspaceError> for GatewayError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotFound { .. } => GatewayError::NotFound(err.to_string()),
            WorkspaceError::Unauthorized { reason } => GatewayError::Forbidden(reason),
            WorkspaceError::InvalidArguments { .. } => GatewayError::InvalidRequest(err.to_string()),
            WorkspaceError::Conflict { message } => GatewayError::Conflict(message),
            WorkspaceError::PayloadTooLarge { message } => GatewayError::PayloadTooLarge(message),
            WorkspaceError::Database(_) | WorkspaceError::Storage(_) => {
                error!(error = ?err, "workspace operation failed");
                GatewayError::Internal
            }
        }
    }
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        if err.is_unauthenticated() {
            return GatewayError::Unauthenticated(err.to_string());
        }
        match err {
            AuthError::UserExists => GatewayError::Conflict(err.to_string()),
            AuthError::InvalidInput(message) => GatewayError::InvalidRequest(message),
            AuthError::GithubOauthDisabled => GatewayError::ServiceUnavailable(err.to_string()),
            AuthError::GithubOauth(_) => {
                error!(error = ?err, "github oauth failed");
                GatewayError::BadGateway(err.to_string())
            }
            _ => {
                error!(error = ?err, "auth operation failed");
                GatewayError::Internal
            }
        }
    }
}

impl From<MultipartError> for GatewayError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            GatewayError::PayloadTooLarge(err.body_text())
        } else {
            GatewayError::InvalidRequest(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_errors_map_to_http_statuses() {
        let cases = [
            (WorkspaceError::not_found("Channel"), StatusCode::NOT_FOUND),
            (WorkspaceError::unauthorized(), StatusCode::FORBIDDEN),
            (WorkspaceError::invalid("bad"), StatusCode::BAD_REQUEST),
            (WorkspaceError::conflict("dup"), StatusCode::CONFLICT),
            (WorkspaceError::too_large("big"), StatusCode::PAYLOAD_TOO_LARGE),
        ];

        for (err, status) in cases {
            assert_eq!(GatewayError::from(err).status_code(), status);
        }
    }

    #[test]
    fn auth_errors_map_to_http_statuses() {
        assert_eq!(
            GatewayError::from(AuthError::SessionExpired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::from(AuthError::UserExists).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::from(AuthError::GithubOauthDisabled).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn storage_failures_hide_details() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = GatewayError::from(WorkspaceError::Storage(io));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
