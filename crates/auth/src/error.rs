use huddle_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidInput(String),
    #[error("user not found")]
    UserNotFound,
    #[error("github oauth is not configured")]
    GithubOauthDisabled,
    #[error("github oauth error: {0}")]
    GithubOauth(#[from] anyhow::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Store(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

impl AuthError {
    /// Whether the caller should be asked to sign in again.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::SessionNotFound
                | Self::SessionExpired
                | Self::InvalidSession
                | Self::UserNotFound
        )
    }
}
