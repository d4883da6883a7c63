//! Users and the sign-in identities linked to them.
//!
//! Every query runs on a caller-owned transaction so that creating a user
//! and linking its first identity commit together.

use chrono::{SecondsFormat, Utc};
use huddle_database::{new_public_id, User};
use sqlx::{Row, Sqlite, Transaction};

use crate::AuthError;

pub(crate) type Tx<'a> = Transaction<'a, Sqlite>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Provider {
    Password,
    Github,
}

impl Provider {
    fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Github => "github",
        }
    }
}

/// A linked identity: owning user plus the stored secret, if any.
pub(crate) struct Identity {
    pub user_id: i64,
    pub secret: Option<String>,
}

pub(crate) async fn find(
    tx: &mut Tx<'_>,
    provider: Provider,
    provider_uid: &str,
) -> Result<Option<Identity>, AuthError> {
    let row = sqlx::query(
        "SELECT user_id, secret FROM user_identities WHERE provider = ? AND provider_uid = ?",
    )
    .bind(provider.as_str())
    .bind(provider_uid)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(|row| {
        Ok(Identity {
            user_id: row.try_get("user_id")?,
            secret: row.try_get("secret")?,
        })
    })
    .transpose()
}

pub(crate) async fn link(
    tx: &mut Tx<'_>,
    user_id: i64,
    provider: Provider,
    provider_uid: &str,
    secret: Option<&str>,
) -> Result<(), AuthError> {
    let now = stamp();
    sqlx::query(
        "INSERT INTO user_identities (user_id, provider, provider_uid, secret, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(provider.as_str())
    .bind(provider_uid)
    .bind(secret)
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn user_id_by_email(
    tx: &mut Tx<'_>,
    email: &str,
) -> Result<Option<i64>, AuthError> {
    Ok(sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut **tx)
        .await?)
}

/// New profile fields for a user row.
#[derive(Default)]
pub(crate) struct NewUser {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub image_url: Option<String>,
}

pub(crate) async fn create_user(tx: &mut Tx<'_>, new: NewUser) -> Result<User, AuthError> {
    let created_at = Utc::now();
    let now = created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let public_id = new_public_id();

    let id = sqlx::query(
        "INSERT INTO users (public_id, email, display_name, image_url, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&public_id)
    .bind(new.email.as_deref())
    .bind(new.display_name.as_deref())
    .bind(new.image_url.as_deref())
    .bind(&now)
    .bind(&now)
    .execute(&mut **tx)
    .await?
    .last_insert_rowid();

    Ok(User {
        id,
        public_id,
        email: new.email,
        display_name: new.display_name,
        image_url: new.image_url,
        created_at,
    })
}

/// Set the avatar only when the user has none yet.
pub(crate) async fn fill_missing_avatar(
    tx: &mut Tx<'_>,
    user_id: i64,
    image_url: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET image_url = COALESCE(image_url, ?), updated_at = ? WHERE id = ?")
        .bind(image_url)
        .bind(stamp())
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
