//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the underlying driver reported a unique constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Duplicate(_) => true,
            DatabaseError::QueryError(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
