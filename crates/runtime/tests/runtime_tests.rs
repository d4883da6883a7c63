use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use huddle_config::AppConfig;
use huddle_runtime::BackendServices;
use sqlx::Row;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(temp_dir: &TempDir, database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config.storage.root = temp_dir.path().join("files").to_string_lossy().into_owned();
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations_and_prepares_storage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(&temp_dir, sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'workspaces'",
    )
    .fetch_one(&services.db_pool)
    .await?;

    assert_eq!("workspaces", table);
    assert!(db_path.exists(), "sqlite file should be created when missing");
    assert!(Path::new(&config.storage.root).is_dir());
    assert!(!services.authenticator.github_enabled());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialised_services_share_the_pool() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(&temp_dir, sqlite_url(&temp_dir.path().join("shared.db")), 2);
    let services = initialise(&config).await?;

    let user = services
        .authenticator
        .register_with_password("runtime@example.com", "password123", Some("Runtime"))
        .await?;
    let workspace = services.workspaces.workspaces.create(&user, "Runtime").await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workspace_members")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(count, 1);
    assert_eq!(workspace.name, "Runtime");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_enables_sqlite_foreign_keys() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/foreign_keys.db");
    let config = build_config(&temp_dir, sqlite_url(&db_path), 2);

    let services = initialise(&config).await?;

    let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(1, enabled, "foreign key enforcement must be enabled");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_applies_max_connections_setting() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/max_conn.db");
    let max_connections = 3;
    let config = build_config(&temp_dir, sqlite_url(&db_path), max_connections);

    let services = initialise(&config).await?;
    assert_eq!(
        max_connections,
        services.db_pool.options().get_max_connections()
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn memory_database_leaves_no_files_behind() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(&temp_dir, "sqlite://:memory:".into(), 1);
    let services = initialise(&config).await?;

    let databases = sqlx::query("PRAGMA database_list")
        .fetch_all(&services.db_pool)
        .await?;
    let main_db = databases
        .into_iter()
        .find(|row| {
            row.try_get::<String, _>("name")
                .map(|name| name == "main")
                .unwrap_or(false)
        })
        .context("expected main in PRAGMA database_list")?;
    let file: String = main_db.try_get("file")?;
    assert!(file.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unusable_storage_root_fails_with_context() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory")?;

    let mut config = build_config(&temp_dir, "sqlite://:memory:".into(), 1);
    config.storage.root = blocker.join("files").to_string_lossy().into_owned();

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected storage setup to fail"),
        Err(error) => error,
    };
    assert!(
        error.to_string().contains("failed to create file storage"),
        "unexpected error: {error:#}"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unopenable_database_fails_with_context() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // A directory cannot be opened as a database file.
    let config = build_config(&temp_dir, sqlite_url(temp_dir.path()), 1);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected database setup to fail"),
        Err(error) => error,
    };
    assert!(error.to_string().contains("failed to initialise database"));
    Ok(())
}

#[test]
fn telemetry_init_tracing_sets_global_subscriber() {
    huddle_runtime::telemetry::init_tracing().expect("first initialisation should succeed");

    let second = huddle_runtime::telemetry::init_tracing();
    assert!(
        second.is_err(),
        "initialising telemetry twice should fail with global subscriber already set"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[cfg_attr(not(unix), ignore = "requires Unix signal handling")]
async fn shutdown_signal_completes_on_ctrl_c_notification() -> Result<()> {
    let shutdown_task = tokio::spawn(async { huddle_runtime::shutdown_signal().await });

    sleep(Duration::from_millis(50)).await;
    #[cfg(unix)]
    unsafe {
        libc::raise(libc::SIGINT);
    }

    timeout(Duration::from_secs(2), shutdown_task).await??;
    Ok(())
}
