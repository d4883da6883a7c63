//! Read access to users. Accounts are created by the auth crate.

use sqlx::SqlitePool;

use crate::entities::User;
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = ?", User::COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(User::from_row).transpose()
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE public_id = ?", User::COLUMNS);
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(User::from_row).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = ?", User::COLUMNS);
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(User::from_row).transpose()
    }

    pub async fn list(&self) -> DatabaseResult<Vec<User>> {
        let query = format!("SELECT {} FROM users ORDER BY id ASC", User::COLUMNS);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(User::from_row).collect()
    }
}
