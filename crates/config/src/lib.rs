use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "huddle.toml",
    "config/huddle.toml",
    "crates/config/huddle.toml",
    "../huddle.toml",
    "../config/huddle.toml",
    "../../huddle.toml",
];

/// Thirty days, matching the lifetime of the browser session cookie.
const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24 * 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    /// Externally reachable base URL, used when handing out file links.
    #[serde(default = "HttpConfig::default_public_url")]
    pub public_url: String,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl HttpConfig {
    fn default_public_url() -> String {
        "http://127.0.0.1:7070".to_string()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
            public_url: Self::default_public_url(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://huddle.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default)]
    pub github: GithubAuthConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            github: GithubAuthConfig::default(),
        }
    }
}

impl AuthConfig {
    fn default_session_ttl() -> u64 {
        DEFAULT_SESSION_TTL_SECONDS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GithubAuthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Where uploaded attachments are kept on disk.
///
/// ```
/// use huddle_config::StorageConfig;
///
/// let storage = StorageConfig::default();
/// assert_eq!(storage.root, "data/files");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_root")]
    pub root: String,
}

impl StorageConfig {
    fn default_root() -> String {
        "data/files".to_string()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "MessagesConfig::default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "MessagesConfig::default_max_page_size")]
    pub max_page_size: u32,
}

impl MessagesConfig {
    const fn default_page_size() -> u32 {
        20
    }

    const fn default_max_page_size() -> u32 {
        100
    }

    /// Resolve a requested page size against the configured bounds.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
        }
    }
}

/// Build the configuration from built-in defaults, then an optional TOML
/// file, then `HUDDLE__*` environment variables, later sources winning.
///
/// ```
/// use huddle_config::load;
///
/// std::env::remove_var("HUDDLE_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let mut builder = with_defaults(config::Config::builder(), &AppConfig::default())?;

    match config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
        }
        None => {
            debug!("no configuration file found, relying on defaults and environment overrides")
        }
    }

    let config = builder
        .add_source(config::Environment::with_prefix("HUDDLE").separator("__"))
        .build()
        .context("unable to build configuration")?
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    let config = normalise(config);
    debug!(?config, "loaded backend configuration");
    Ok(config)
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

fn with_defaults(builder: Builder, defaults: &AppConfig) -> anyhow::Result<Builder> {
    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    Ok(builder
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("http.public_url", defaults.http.public_url.clone())?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("storage.root", defaults.storage.root.clone())?
        .set_default(
            "messages.default_page_size",
            i64::from(defaults.messages.default_page_size),
        )?
        .set_default(
            "messages.max_page_size",
            i64::from(defaults.messages.max_page_size),
        )?)
}

/// `HUDDLE_CONFIG` wins; otherwise the first well-known location that
/// exists relative to the working directory.
fn config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("HUDDLE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let cwd = std::env::current_dir().ok()?;
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|candidate| cwd.join(candidate))
        .find(|path| path.exists())
}

fn normalise(mut config: AppConfig) -> AppConfig {
    // Session expiry is stored as a signed timestamp.
    config.auth.session_ttl_seconds = config.auth.session_ttl_seconds.min(i64::MAX as u64);
    config.messages.max_page_size = config.messages.max_page_size.max(1);
    config.messages.default_page_size = config
        .messages
        .default_page_size
        .clamp(1, config.messages.max_page_size);
    config
}
