//! Demo seeding, inspection and cleanup of the database.

use anyhow::{Context, Result};
use huddle_auth::AuthError;
use huddle_runtime::BackendServices;
use huddle_workspaces::{CreateMessageRequest, FileStore, MemberView};
use sqlx::Row;
use tracing::{info, warn};

pub const DEMO_EMAIL: &str = "demo@huddle.local";
pub const DEMO_PASSWORD: &str = "password123";
const TEAMMATE_EMAIL: &str = "sam@huddle.local";
const DEMO_WORKSPACE: &str = "Huddle Demo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub workspace_id: String,
    pub join_code: String,
    pub channels: usize,
    pub messages: usize,
}

/// Create the demo accounts and a populated workspace.
///
/// Returns `None` when the demo user already exists.
pub async fn seed(services: &BackendServices) -> Result<Option<SeedSummary>> {
    let auth = &services.authenticator;
    let demo = match auth
        .register_with_password(DEMO_EMAIL, DEMO_PASSWORD, Some("Demo User"))
        .await
    {
        Ok(user) => user,
        Err(AuthError::UserExists) => {
            warn!(email = DEMO_EMAIL, "demo user exists, skipping seed");
            return Ok(None);
        }
        Err(err) => return Err(err).context("failed to create demo user"),
    };
    let teammate = auth
        .register_with_password(TEAMMATE_EMAIL, DEMO_PASSWORD, Some("Sam Rivera"))
        .await
        .context("failed to create teammate user")?;

    let ws = &services.workspaces;
    let workspace = ws.workspaces.create(&demo, DEMO_WORKSPACE).await?;
    let sam: MemberView = ws
        .workspaces
        .join(&teammate, &workspace.id, &workspace.join_code)
        .await?;

    ws.channels
        .create(&demo, &workspace.id, "random", Some("Off-topic chatter"))
        .await?;
    ws.channels
        .create(&demo, &workspace.id, "announcements", Some("Company-wide news"))
        .await?;
    let channels = ws.channels.list(&demo, &workspace.id).await?;
    let general = channels
        .iter()
        .find(|channel| channel.name == "general")
        .context("workspace has no general channel")?;

    let post = |text: &str| CreateMessageRequest {
        workspace_id: workspace.id.clone(),
        text: Some(text.to_string()),
        channel_id: Some(general.id.clone()),
        ..Default::default()
    };

    let mut messages = 0;
    let welcome = ws
        .messages
        .create(&demo, post("Welcome to Huddle! This is the general channel."))
        .await?;
    ws.messages
        .create(&demo, post("Say hi and tell everyone what you are working on."))
        .await?;
    let hello = ws
        .messages
        .create(&teammate, post("Hi all, Sam here. Working on the mobile client."))
        .await?;
    messages += 3;

    ws.messages
        .create(
            &demo,
            CreateMessageRequest {
                parent_message_id: Some(hello.id.clone()),
                ..post("Great to have you, Sam!")
            },
        )
        .await?;
    messages += 1;

    ws.messages.toggle_reaction(&teammate, &welcome.id, "👋").await?;
    ws.messages.toggle_reaction(&demo, &hello.id, "🎉").await?;
    ws.messages.toggle_reaction(&teammate, &hello.id, "🎉").await?;

    let conversation = ws
        .conversations
        .create_or_get(&demo, &workspace.id, &sam.id)
        .await?;
    ws.messages
        .create(
            &demo,
            CreateMessageRequest {
                workspace_id: workspace.id.clone(),
                text: Some("Ping me if you need access to anything.".to_string()),
                conversation_id: Some(conversation.conversation.id.clone()),
                ..Default::default()
            },
        )
        .await?;
    messages += 1;

    info!(workspace_id = %workspace.id, messages, "seeded demo workspace");

    Ok(Some(SeedSummary {
        workspace_id: workspace.id,
        join_code: workspace.join_code,
        channels: channels.len(),
        messages,
    }))
}

/// Row counts per table, in the order they are printed.
pub async fn table_counts(services: &BackendServices) -> Result<Vec<(&'static str, i64)>> {
    const TABLES: [&str; 9] = [
        "users",
        "workspaces",
        "workspace_members",
        "channels",
        "conversations",
        "messages",
        "reactions",
        "stored_files",
        "sessions",
    ];

    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&services.db_pool)
            .await
            .with_context(|| format!("failed to count {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

pub async fn dump(services: &BackendServices) -> Result<()> {
    let pool = &services.db_pool;

    println!("=== TABLES ===");
    for (table, count) in table_counts(services).await? {
        println!("{table:<20} {count}");
    }

    println!("\n=== USERS ===");
    let users = sqlx::query(
        "SELECT public_id, email, display_name, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch users")?;
    if users.is_empty() {
        println!("No users found in database");
    }
    for user in users {
        let public_id: String = user.try_get("public_id")?;
        let email: Option<String> = user.try_get("email")?;
        let name: Option<String> = user.try_get("display_name")?;
        println!(
            "{:<26} {:<30} {}",
            public_id,
            email.as_deref().unwrap_or("-"),
            name.as_deref().unwrap_or("-")
        );
    }

    println!("\n=== WORKSPACES ===");
    let workspaces = sqlx::query(
        r#"
        SELECT w.id, w.public_id, w.name, w.join_code,
               (SELECT COUNT(*) FROM workspace_members m WHERE m.workspace_id = w.id) AS members
        FROM workspaces w
        ORDER BY w.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("failed to fetch workspaces")?;
    if workspaces.is_empty() {
        println!("No workspaces found in database");
    }

    for workspace in workspaces {
        let id: i64 = workspace.try_get("id")?;
        let public_id: String = workspace.try_get("public_id")?;
        let name: String = workspace.try_get("name")?;
        let join_code: String = workspace.try_get("join_code")?;
        let members: i64 = workspace.try_get("members")?;
        println!("{name} ({public_id}) join code {join_code}, {members} members");

        let channels = sqlx::query(
            r#"
            SELECT c.name,
                   (SELECT COUNT(*) FROM messages m WHERE m.channel_id = c.id) AS messages
            FROM channels c
            WHERE c.workspace_id = ?
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await
        .context("failed to fetch channels")?;

        for channel in channels {
            let channel_name: String = channel.try_get("name")?;
            let count: i64 = channel.try_get("messages")?;
            println!("  #{channel_name:<24} {count} messages");
        }

        let direct: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE workspace_id = ? AND conversation_id IS NOT NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .context("failed to count direct messages")?;
        println!("  direct messages: {direct}");
    }

    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClearSummary {
    pub workspaces: u64,
    pub messages: u64,
    pub files: u64,
}

/// Delete every workspace and upload. Users and sessions are kept.
pub async fn clear(services: &BackendServices, store: &FileStore) -> Result<ClearSummary> {
    let pool = &services.db_pool;
    let storage_ids: Vec<String> = sqlx::query_scalar("SELECT storage_id FROM stored_files")
        .fetch_all(pool)
        .await
        .context("failed to list stored files")?;

    let mut tx = pool.begin().await?;
    let mut summary = ClearSummary::default();
    for table in [
        "reactions",
        "message_files",
        "messages",
        "conversations",
        "channels",
        "workspace_members",
        "stored_files",
        "workspaces",
    ] {
        let result = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to clear {table}"))?;
        match table {
            "messages" => summary.messages = result.rows_affected(),
            "stored_files" => summary.files = result.rows_affected(),
            "workspaces" => summary.workspaces = result.rows_affected(),
            _ => {}
        }
    }
    tx.commit().await?;

    for storage_id in storage_ids {
        if let Err(err) = store.delete(&storage_id).await {
            warn!(storage_id = %storage_id, error = %err, "failed to remove blob");
        }
    }

    info!(
        workspaces = summary.workspaces,
        messages = summary.messages,
        files = summary.files,
        "cleared workspace data"
    );
    Ok(summary)
}
