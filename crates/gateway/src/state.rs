//! Shared state handed to every handler.

use std::{collections::HashMap, sync::Arc, time::Duration, time::Instant};

use huddle_auth::{AuthSession, Authenticator};
use huddle_config::AppConfig;
use huddle_database::User;
use huddle_workspaces::WorkspaceServices;
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;

use crate::error::GatewayResult;

const DEFAULT_OAUTH_STATE_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
pub struct GatewayState {
    authenticator: Authenticator,
    services: WorkspaceServices,
    oauth_state: OAuthStateStore,
    config: Arc<AppConfig>,
}

impl GatewayState {
    pub fn new(authenticator: Authenticator, services: WorkspaceServices, config: AppConfig) -> Self {
        Self::with_oauth_store(authenticator, services, config, OAuthStateStore::default())
    }

    pub fn with_oauth_store(
        authenticator: Authenticator,
        services: WorkspaceServices,
        config: AppConfig,
        oauth_state: OAuthStateStore,
    ) -> Self {
        Self {
            authenticator,
            services,
            oauth_state,
            config: Arc::new(config),
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn services(&self) -> &WorkspaceServices {
        &self.services
    }

    pub fn oauth_state(&self) -> &OAuthStateStore {
        &self.oauth_state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn authenticate(&self, token: &str) -> GatewayResult<(User, AuthSession)> {
        Ok(self.authenticator.authenticate_token(token).await?)
    }
}

/// One-shot CSRF states for the GitHub sign-in round trip.
#[derive(Clone)]
pub struct OAuthStateStore {
    inner: Arc<Mutex<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn issue(&self) -> String {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let mut guard = self.inner.lock().await;
        Self::prune(&mut guard, self.ttl);
        guard.insert(state.clone(), Instant::now());
        state
    }

    /// True exactly once per issued, unexpired state.
    pub async fn consume(&self, state: &str) -> bool {
        let mut guard = self.inner.lock().await;
        Self::prune(&mut guard, self.ttl);
        guard.remove(state).is_some()
    }

    fn prune(map: &mut HashMap<String, Instant>, ttl: Duration) {
        let now = Instant::now();
        map.retain(|_, created| now.duration_since(*created) <= ttl);
    }
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_OAUTH_STATE_TTL)
    }
}
