//! Database migrations

use sqlx::{migrate::Migrator, SqlitePool};
use tracing::info;

use crate::types::DatabaseResult;

/// Migrations embedded from the workspace-level `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_migrations(pool: &SqlitePool) -> DatabaseResult<()> {
    MIGRATOR.run(pool).await?;
    info!("database migrations applied");
    Ok(())
}
