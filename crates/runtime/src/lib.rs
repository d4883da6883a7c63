use anyhow::{Context, Result};
use huddle_auth::Authenticator;
use huddle_config::AppConfig;
use huddle_database::initialize_database;
use huddle_workspaces::WorkspaceServices;
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt, EnvFilter};

    /// Environment variable selecting the log output format.
    pub const LOG_FORMAT_ENV: &str = "HUDDLE_LOG_FORMAT";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LogFormat {
        Pretty,
        Json,
    }

    impl LogFormat {
        pub fn from_value(value: Option<&str>) -> Self {
            match value.map(str::trim) {
                Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            }
        }

        pub fn from_env() -> Self {
            Self::from_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
        }
    }

    /// Install the global subscriber. `RUST_LOG` filters, defaulting to `info`.
    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt().with_env_filter(env_filter).with_target(true);

        let result = match LogFormat::from_env() {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };

        result.map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }

}

/// Everything the server needs, wired to one database pool.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub workspaces: WorkspaceServices,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        tokio::fs::create_dir_all(&config.storage.root)
            .await
            .with_context(|| {
                format!("failed to create file storage at {}", config.storage.root)
            })?;

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());
        let workspaces = WorkspaceServices::new(db_pool.clone(), config);

        info!(
            database = %config.database.url,
            storage = %config.storage.root,
            github = authenticator.github_enabled(),
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            workspaces,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
