//! Sign-in and session handling.
//!
//! Users register with an email and password or arrive through GitHub
//! OAuth. Either way they receive an opaque bearer token backed by a row in
//! `sessions`.

mod error;
mod github;
mod identity;
mod credentials;
mod session;

use huddle_config::AuthConfig;
use huddle_database::{User, UserRepository};
use sqlx::SqlitePool;
use tracing::info;

pub use error::AuthError;
pub use github::GithubProfile;
pub use credentials::MIN_PASSWORD_LENGTH;
pub use session::AuthSession;

use github::GithubClient;
use identity::{NewUser, Provider};
use session::SessionStore;

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    users: UserRepository,
    sessions: SessionStore,
    github: Option<GithubClient>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionStore::new(pool.clone(), config.session_ttl_seconds),
            github: GithubClient::from_config(&config.github),
            pool,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn github_enabled(&self) -> bool {
        self.github.is_some()
    }

    fn github(&self) -> Result<&GithubClient, AuthError> {
        self.github.as_ref().ok_or(AuthError::GithubOauthDisabled)
    }

    pub fn github_authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> Result<String, AuthError> {
        Ok(self.github()?.authorize_url(state, redirect_uri)?)
    }

    /// Create a password account. Emails are matched case-insensitively.
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = credentials::normalize_email(email)?;
        credentials::check_strength(password)?;
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned);

        let mut tx = self.pool.begin().await?;
        if identity::user_id_by_email(&mut tx, &email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let secret = credentials::hash(password)?;
        let user = identity::create_user(
            &mut tx,
            NewUser {
                email: Some(email.clone()),
                display_name,
                image_url: None,
            },
        )
        .await?;
        identity::link(&mut tx, user.id, Provider::Password, &email, Some(&secret)).await?;
        tx.commit().await?;

        info!(user = %user.public_id, "registered password account");
        Ok(user)
    }

    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();

        let mut tx = self.pool.begin().await?;
        let found = identity::find(&mut tx, Provider::Password, &email).await?;
        tx.commit().await?;

        let Some(linked) = found else {
            return Err(AuthError::InvalidCredentials);
        };
        let stored = linked.secret.ok_or(AuthError::InvalidCredentials)?;
        credentials::verify(password, &stored)?;

        self.fetch_user(linked.user_id).await?;
        self.sessions.issue(linked.user_id).await
    }

    pub async fn login_with_github_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AuthSession, AuthError> {
        let profile = self.github()?.fetch_profile(code, redirect_uri).await?;
        self.login_with_github_profile(profile).await
    }

    /// Resolve a GitHub profile to a user: by linked identity, then by
    /// email, else a fresh account.
    pub async fn login_with_github_profile(
        &self,
        profile: GithubProfile,
    ) -> Result<AuthSession, AuthError> {
        let mut tx = self.pool.begin().await?;

        if let Some(linked) = identity::find(&mut tx, Provider::Github, &profile.id).await? {
            tx.commit().await?;
            return self.sessions.issue(linked.user_id).await;
        }

        let email = profile.email.as_deref().map(str::to_lowercase);
        let existing = match email.as_deref() {
            Some(email) => identity::user_id_by_email(&mut tx, email).await?,
            None => None,
        };

        let user_id = match existing {
            Some(user_id) => {
                if let Some(avatar) = profile.avatar_url.as_deref() {
                    identity::fill_missing_avatar(&mut tx, user_id, avatar).await?;
                }
                user_id
            }
            None => {
                let new = NewUser {
                    email: email.clone(),
                    display_name: profile.name.clone(),
                    image_url: profile.avatar_url.clone(),
                };
                identity::create_user(&mut tx, new).await?.id
            }
        };

        identity::link(&mut tx, user_id, Provider::Github, &profile.id, None).await?;
        tx.commit().await?;

        info!(user_id, email = ?email, "linked github identity");
        self.sessions.issue(user_id).await
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let session = self.sessions.resolve(token).await?;
        let user = self.fetch_user(session.user_id).await?;
        Ok((user, session))
    }

    /// Revoke a session token.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if !self.sessions.delete(token).await? {
            return Err(AuthError::SessionNotFound);
        }
        info!("session revoked");
        Ok(())
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.fetch_user(user_id).await
    }

    async fn fetch_user(&self, id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
