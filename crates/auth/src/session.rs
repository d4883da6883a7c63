//! Opaque bearer tokens backed by the `sessions` table.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::AuthError;

/// Upper bound for session lifetimes; keeps expiry arithmetic in range.
const MAX_SESSION_TTL_SECONDS: i64 = 100 * 365 * 24 * 60 * 60;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub(crate) struct SessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SessionStore {
    pub(crate) fn new(pool: SqlitePool, ttl_seconds: u64) -> Self {
        let seconds = i64::try_from(ttl_seconds)
            .unwrap_or(i64::MAX)
            .clamp(1, MAX_SESSION_TTL_SECONDS);
        Self {
            pool,
            ttl: Duration::seconds(seconds),
        }
    }

    pub(crate) async fn issue(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        let session = AuthSession {
            token: new_token(),
            user_id,
            expires_at: now + self.ttl,
        };

        sqlx::query(
            "INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(now.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(user_id, expires_at = %session.expires_at, "issued session");
        Ok(session)
    }

    /// Resolve a live token. Expired rows are deleted on sight.
    pub(crate) async fn resolve(&self, token: &str) -> Result<AuthSession, AuthError> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let user_id: i64 = row.try_get("user_id")?;
        let expires_at: String = row.try_get("expires_at")?;
        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            self.delete(token).await?;
            debug!(user_id, "dropped expired session");
            return Err(AuthError::SessionExpired);
        }

        Ok(AuthSession {
            token: token.to_owned(),
            user_id,
            expires_at,
        })
    }

    /// Returns whether a row was removed.
    pub(crate) async fn delete(&self, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
