//! GitHub OAuth web flow.

use anyhow::Context;
use huddle_config::GithubAuthConfig;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, warn};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_API: &str = "https://api.github.com/user";
const SCOPES: [&str; 2] = ["read:user", "user:email"];

/// What Huddle keeps from a GitHub account.
#[derive(Debug, Clone)]
pub struct GithubProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl From<ApiUser> for GithubProfile {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name.or(Some(user.login)),
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Clone)]
pub(crate) struct GithubClient {
    oauth: BasicClient,
    http: reqwest::Client,
}

impl GithubClient {
    /// `None` unless both the client id and secret are configured.
    pub(crate) fn from_config(config: &GithubAuthConfig) -> Option<Self> {
        let (Some(id), Some(secret)) = (&config.client_id, &config.client_secret) else {
            return None;
        };
        Self::build(id, secret)
            .map_err(|err| warn!(error = %err, "github oauth disabled"))
            .ok()
    }

    fn build(client_id: &str, client_secret: &str) -> anyhow::Result<Self> {
        let oauth = BasicClient::new(
            ClientId::new(client_id.to_owned()),
            Some(ClientSecret::new(client_secret.to_owned())),
            AuthUrl::new(AUTHORIZE_URL.to_owned()).context("invalid github auth url")?,
            Some(TokenUrl::new(TOKEN_URL.to_owned()).context("invalid github token url")?),
        )
        .set_auth_type(AuthType::RequestBody);

        let http = reqwest::Client::builder()
            .user_agent("huddle-backend")
            .build()
            .context("failed to build github http client")?;

        Ok(Self { oauth, http })
    }

    fn redirected(&self, redirect_uri: &str) -> anyhow::Result<BasicClient> {
        let redirect = RedirectUrl::new(redirect_uri.to_owned())
            .context("invalid redirect uri for github oauth")?;
        Ok(self.oauth.clone().set_redirect_uri(redirect))
    }

    pub(crate) fn authorize_url(&self, state: &str, redirect_uri: &str) -> anyhow::Result<String> {
        let (url, _) = self
            .redirected(redirect_uri)?
            .authorize_url(|| CsrfToken::new(state.to_owned()))
            .add_scopes(SCOPES.iter().map(|scope| Scope::new((*scope).to_owned())))
            .url();
        Ok(url.to_string())
    }

    /// Trade an authorization code for the signed-in account's profile.
    pub(crate) async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<GithubProfile> {
        let token = self
            .redirected(redirect_uri)?
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(async_http_client)
            .await
            .context("failed to exchange github oauth code")?;

        let user: ApiUser = self
            .http
            .get(USER_API)
            .bearer_auth(token.access_token().secret())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .context("failed to call github user api")?
            .error_for_status()
            .context("github user api returned error")?
            .json()
            .await
            .context("failed to decode github user response")?;

        debug!(login = %user.login, id = user.id, "fetched github user profile");
        Ok(user.into())
    }
}
