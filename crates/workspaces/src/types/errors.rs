//! Error types for workspace operations.

use huddle_database::DatabaseError;
use thiserror::Error;

/// Result type alias for workspace operations
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{reason}")]
    Unauthorized { reason: String },

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    PayloadTooLarge { message: String },

    #[error("File storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl WorkspaceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// The generic membership/role failure.
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            reason: "Unauthorized".to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for WorkspaceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(DatabaseError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_read_like_user_facing_errors() {
        assert_eq!(WorkspaceError::unauthorized().to_string(), "Unauthorized");
        assert_eq!(
            WorkspaceError::not_found("Workspace").to_string(),
            "Workspace not found"
        );
        assert_eq!(
            WorkspaceError::invalid("name must be 2-50 characters").to_string(),
            "Invalid arguments: name must be 2-50 characters"
        );
    }
}
