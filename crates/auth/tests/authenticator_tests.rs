//! Sign-in flows against a migrated SQLite file.

use std::collections::HashSet;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use huddle_auth::{AuthError, AuthSession, Authenticator, GithubProfile};
use huddle_config::{AuthConfig, GithubAuthConfig};
use huddle_database::User;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const EMAIL: &str = "alice@example.com";
const PASSWORD: &str = "correct-horse";
const TTL_SECONDS: u64 = 3_600;

struct Harness {
    auth: Authenticator,
    pool: SqlitePool,
    _dir: TempDir,
}

impl Harness {
    async fn start() -> TestResult<Self> {
        Self::with_github(None).await
    }

    async fn with_github(credentials: Option<(&str, &str)>) -> TestResult<Self> {
        Self::with_config(AuthConfig {
            session_ttl_seconds: TTL_SECONDS,
            github: GithubAuthConfig {
                client_id: credentials.map(|(id, _)| id.to_owned()),
                client_secret: credentials.map(|(_, secret)| secret.to_owned()),
            },
        })
        .await
    }

    async fn with_config(config: AuthConfig) -> TestResult<Self> {
        let dir = TempDir::new()?;
        let url = format!("sqlite://{}", dir.path().join("auth.sqlite").display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::from_str(&url)?
                    .create_if_missing(true)
                    .foreign_keys(true),
            )
            .await?;
        MIGRATOR.run(&pool).await?;

        Ok(Self {
            auth: Authenticator::new(pool.clone(), config),
            pool,
            _dir: dir,
        })
    }

    async fn alice(&self) -> TestResult<User> {
        Ok(self
            .auth
            .register_with_password(EMAIL, PASSWORD, Some("Alice"))
            .await?)
    }

    async fn login(&self) -> TestResult<AuthSession> {
        Ok(self.auth.login_with_password(EMAIL, PASSWORD).await?)
    }

    async fn count(&self, sql: &str) -> TestResult<i64> {
        Ok(sqlx::query_scalar(sql).fetch_one(&self.pool).await?)
    }

    async fn secret_of(&self, user: &User) -> TestResult<String> {
        Ok(sqlx::query_scalar(
            "SELECT secret FROM user_identities WHERE user_id = ? AND provider = 'password'",
        )
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?)
    }
}

fn github_profile(id: &str, email: Option<&str>, avatar: Option<&str>) -> GithubProfile {
    GithubProfile {
        id: id.to_owned(),
        email: email.map(str::to_owned),
        name: Some("Alice Example".into()),
        avatar_url: avatar.map(str::to_owned),
    }
}

#[tokio::test]
async fn registration_stores_an_argon2_password_identity() -> TestResult {
    let h = Harness::start().await?;
    let user = h.alice().await?;

    assert_eq!(user.display_name.as_deref(), Some("Alice"));
    assert_eq!(user.email.as_deref(), Some(EMAIL));
    assert!(h.secret_of(&user).await?.starts_with("$argon2"));
    Ok(())
}

#[tokio::test]
async fn registration_rejects_bad_input() -> TestResult {
    let h = Harness::start().await?;
    h.alice().await?;

    let duplicate = h
        .auth
        .register_with_password("ALICE@example.com", "another-pass", None)
        .await;
    assert!(matches!(duplicate, Err(AuthError::UserExists)));

    let short = h
        .auth
        .register_with_password("bob@example.com", "short", None)
        .await;
    assert!(matches!(short, Err(AuthError::InvalidInput(_))));

    let malformed = h
        .auth
        .register_with_password("not-an-email", PASSWORD, None)
        .await;
    assert!(matches!(malformed, Err(AuthError::InvalidInput(_))));

    assert_eq!(h.count("SELECT COUNT(*) FROM users").await?, 1);
    Ok(())
}

#[tokio::test]
async fn each_password_gets_its_own_salt() -> TestResult {
    let h = Harness::start().await?;
    let alice = h.alice().await?;
    let bob = h
        .auth
        .register_with_password("bob@example.com", PASSWORD, None)
        .await?;

    assert_ne!(h.secret_of(&alice).await?, h.secret_of(&bob).await?);
    Ok(())
}

#[tokio::test]
async fn password_login_issues_a_persisted_session() -> TestResult {
    let h = Harness::start().await?;
    h.alice().await?;

    let session = h
        .auth
        .login_with_password(" Alice@Example.com ", PASSWORD)
        .await?;

    let expected = Utc::now() + Duration::seconds(TTL_SECONDS as i64);
    assert!((session.expires_at - expected).num_seconds().abs() <= 2);

    let stored: String = sqlx::query_scalar("SELECT expires_at FROM sessions WHERE token = ?")
        .bind(&session.token)
        .fetch_one(&h.pool)
        .await?;
    assert_eq!(
        DateTime::parse_from_rfc3339(&stored)?.with_timezone(&Utc),
        session.expires_at
    );
    Ok(())
}

#[tokio::test]
async fn password_login_failures_issue_nothing() -> TestResult {
    let h = Harness::start().await?;
    h.alice().await?;

    for (email, password) in [(EMAIL, "bad-secret"), ("unknown@example.com", PASSWORD)] {
        let result = h.auth.login_with_password(email, password).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
    assert_eq!(h.count("SELECT COUNT(*) FROM sessions").await?, 0);
    Ok(())
}

#[tokio::test]
async fn github_login_prefers_the_linked_identity() -> TestResult {
    let h = Harness::start().await?;
    let alice = h.alice().await?;

    let first = h
        .auth
        .login_with_github_profile(github_profile("gh-1", Some(EMAIL), None))
        .await?;
    assert_eq!(first.user_id, alice.id);

    // Email changed on GitHub; the identity link still wins.
    let second = h
        .auth
        .login_with_github_profile(github_profile("gh-1", Some("elsewhere@example.com"), None))
        .await?;
    assert_eq!(second.user_id, alice.id);
    assert_eq!(h.count("SELECT COUNT(*) FROM users").await?, 1);
    Ok(())
}

#[tokio::test]
async fn github_login_matches_email_and_fills_missing_avatar() -> TestResult {
    let h = Harness::start().await?;
    let alice = h.alice().await?;

    let session = h
        .auth
        .login_with_github_profile(github_profile(
            "gh-2",
            Some("Alice@Example.com"),
            Some("https://avatars.example.com/alice.png"),
        ))
        .await?;
    assert_eq!(session.user_id, alice.id);

    let profile = h.auth.user_profile(alice.id).await?;
    assert_eq!(
        profile.image_url.as_deref(),
        Some("https://avatars.example.com/alice.png")
    );
    Ok(())
}

#[tokio::test]
async fn github_login_creates_a_user_for_unknown_profiles() -> TestResult {
    let h = Harness::start().await?;

    let session = h
        .auth
        .login_with_github_profile(github_profile(
            "gh-3",
            None,
            Some("https://avatars.example.com/new.png"),
        ))
        .await?;

    let user = h.auth.user_profile(session.user_id).await?;
    assert!(user.email.is_none());
    assert_eq!(user.display_name.as_deref(), Some("Alice Example"));
    assert_eq!(
        h.count("SELECT COUNT(*) FROM user_identities WHERE provider = 'github'")
            .await?,
        1
    );
    Ok(())
}

#[tokio::test]
async fn github_is_unavailable_without_credentials() -> TestResult {
    let h = Harness::start().await?;
    assert!(!h.auth.github_enabled());

    assert!(matches!(
        h.auth.github_authorization_url("state", "https://example.com/cb"),
        Err(AuthError::GithubOauthDisabled)
    ));
    assert!(matches!(
        h.auth
            .login_with_github_code("code", "https://example.com/cb")
            .await,
        Err(AuthError::GithubOauthDisabled)
    ));
    Ok(())
}

#[tokio::test]
async fn github_authorization_url_carries_state_and_scopes() -> TestResult {
    let h = Harness::with_github(Some(("client-id", "client-secret"))).await?;
    assert!(h.auth.github_enabled());

    let url = h
        .auth
        .github_authorization_url("state-123", "https://example.com/callback")?;
    let url = reqwest::Url::parse(&url)?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    assert_eq!(param("state").as_deref(), Some("state-123"));
    assert_eq!(param("client_id").as_deref(), Some("client-id"));
    let scope = param("scope").unwrap_or_default();
    assert!(scope.contains("read:user") && scope.contains("user:email"));
    Ok(())
}

#[tokio::test]
async fn github_code_exchange_validates_redirect_first() -> TestResult {
    let h = Harness::with_github(Some(("client-id", "client-secret"))).await?;
    let result = h
        .auth
        .login_with_github_code("code", "not-a-valid-url")
        .await;
    assert!(matches!(result, Err(AuthError::GithubOauth(_))));
    Ok(())
}

#[tokio::test]
async fn tokens_resolve_to_their_user() -> TestResult {
    let h = Harness::start().await?;
    let alice = h.alice().await?;
    let session = h.login().await?;

    let (user, resolved) = h.auth.authenticate_token(&session.token).await?;
    assert_eq!(user.id, alice.id);
    assert_eq!(resolved.token, session.token);

    assert!(matches!(
        h.auth.authenticate_token("missing-token").await,
        Err(AuthError::SessionNotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn expired_sessions_are_rejected_and_deleted() -> TestResult {
    let h = Harness::start().await?;
    let alice = h.alice().await?;

    sqlx::query("INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(alice.id)
        .bind("stale")
        .bind((Utc::now() - Duration::hours(2)).to_rfc3339())
        .bind((Utc::now() - Duration::hours(1)).to_rfc3339())
        .execute(&h.pool)
        .await?;

    assert!(matches!(
        h.auth.authenticate_token("stale").await,
        Err(AuthError::SessionExpired)
    ));
    assert_eq!(h.count("SELECT COUNT(*) FROM sessions").await?, 0);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_exactly_once() -> TestResult {
    let h = Harness::start().await?;
    h.alice().await?;
    let session = h.login().await?;

    h.auth.logout(&session.token).await?;
    assert!(matches!(
        h.auth.authenticate_token(&session.token).await,
        Err(AuthError::SessionNotFound)
    ));
    assert!(matches!(
        h.auth.logout(&session.token).await,
        Err(AuthError::SessionNotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn session_tokens_are_unique_url_safe_and_32_bytes() -> TestResult {
    let h = Harness::start().await?;
    h.alice().await?;

    let mut seen = HashSet::new();
    for _ in 0..5 {
        let token = h.login().await?.token;
        assert_eq!(URL_SAFE_NO_PAD.decode(token.as_bytes())?.len(), 32);
        assert!(seen.insert(token));
    }
    Ok(())
}

#[tokio::test]
async fn oversized_ttl_still_produces_a_future_expiry() -> TestResult {
    let h = Harness::with_config(AuthConfig {
        session_ttl_seconds: u64::MAX,
        github: GithubAuthConfig::default(),
    })
    .await?;
    h.alice().await?;

    let session = h.login().await?;
    assert!(session.expires_at > Utc::now() + Duration::days(365));
    Ok(())
}
