use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use huddle_auth::Authenticator;
use huddle_config::AppConfig;
use huddle_gateway::{create_router, GatewayState};
use huddle_workspaces::WorkspaceServices;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const PASSWORD: &str = "password123";

struct TestContext {
    _temp_dir: TempDir,
    router: Router,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_url = format!("sqlite://{}", temp_dir.path().join("gateway.sqlite").display());

        let options = SqliteConnectOptions::from_str(&db_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        MIGRATOR.run(&pool).await?;

        let mut config = AppConfig::default();
        config.http.public_url = "http://huddle.test".to_string();
        config.storage.root = temp_dir.path().join("files").display().to_string();

        let authenticator = Authenticator::new(pool.clone(), config.auth.clone());
        let services = WorkspaceServices::new(pool, &config);
        let router = create_router(GatewayState::new(authenticator, services, config));

        Ok(Self {
            _temp_dir: temp_dir,
            router,
        })
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    /// Multipart upload of one `file` field; returns the status and body.
    async fn upload(
        &self,
        token: &str,
        file_name: &str,
        content_type: &str,
        data: &str,
    ) -> TestResult<(StatusCode, Value)> {
        let boundary = "huddle-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {data}\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    /// Register a user and return their bearer token.
    async fn register(&self, email: &str, name: &str) -> TestResult<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": PASSWORD, "display_name": name })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        Ok(body["token"].as_str().unwrap().to_string())
    }

    /// Create a workspace and return `(workspace_id, join_code, general_channel_id)`.
    async fn workspace(&self, token: &str, name: &str) -> TestResult<(String, String, String)> {
        let (status, workspace) = self
            .send(
                Method::POST,
                "/api/workspaces",
                Some(token),
                Some(json!({ "name": name })),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
        let workspace_id = workspace["id"].as_str().unwrap().to_string();

        let (_, channels) = self
            .send(
                Method::GET,
                &format!("/api/workspaces/{workspace_id}/channels"),
                Some(token),
                None,
            )
            .await?;
        let channel_id = channels[0]["id"].as_str().unwrap().to_string();

        Ok((
            workspace_id,
            workspace["join_code"].as_str().unwrap().to_string(),
            channel_id,
        ))
    }
}

#[tokio::test]
async fn health_reports_database_up() -> TestResult {
    let ctx = TestContext::new().await?;
    let (status, body) = ctx.send(Method::GET, "/health", None, None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_session() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx.send(Method::GET, "/api/workspaces", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "401");
    assert_eq!(body["message"], "Missing authorization header");

    let (status, _) = ctx
        .send(Method::GET, "/api/workspaces", Some("not-a-token"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_login_me_and_logout() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.register("ada@example.com", "Ada").await?;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": "ADA@example.com", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = ctx
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["name"], "Ada");

    let (status, me) = ctx.send(Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");

    let (status, _) = ctx
        .send(Method::POST, "/api/auth/logout", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, "/api/auth/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn github_login_is_unavailable_without_credentials() -> TestResult {
    let ctx = TestContext::new().await?;

    let (status, body) = ctx
        .send(
            Method::GET,
            "/api/auth/github/login?redirect_uri=http://localhost/callback",
            None,
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "503");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/auth/github/callback",
            None,
            Some(json!({ "code": "c", "state": "forged", "redirect_uri": "http://localhost" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn joining_and_membership_gates() -> TestResult {
    let ctx = TestContext::new().await?;
    let owner = ctx.register("owner@example.com", "Owner").await?;
    let guest = ctx.register("guest@example.com", "Guest").await?;
    let (workspace_id, join_code, _) = ctx.workspace(&owner, "Acme").await?;

    let (status, body) = ctx
        .send(Method::GET, &format!("/api/workspaces/{workspace_id}"), Some(&guest), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Unauthorized");

    let (status, info) = ctx
        .send(
            Method::GET,
            &format!("/api/workspaces/{workspace_id}/info"),
            Some(&guest),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["is_member"], false);
    assert!(info.get("join_code").is_none());

    let join_uri = format!("/api/workspaces/{workspace_id}/join");
    let (status, _) = ctx
        .send(Method::POST, &join_uri, Some(&guest), Some(json!({ "join_code": "zzzzzz" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, member) = ctx
        .send(
            Method::POST,
            &join_uri,
            Some(&guest),
            Some(json!({ "join_code": join_code.to_uppercase() })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["role"], "member");

    let (status, _) = ctx
        .send(Method::POST, &join_uri, Some(&guest), Some(json!({ "join_code": join_code })))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, members) = ctx
        .send(
            Method::GET,
            &format!("/api/workspaces/{workspace_id}/members"),
            Some(&guest),
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    // Members cannot manage channels.
    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/workspaces/{workspace_id}/channels"),
            Some(&guest),
            Some(json!({ "name": "Random Stuff" })),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, channel) = ctx
        .send(
            Method::POST,
            &format!("/api/workspaces/{workspace_id}/channels"),
            Some(&owner),
            Some(json!({ "name": "Random Stuff" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(channel["name"], "random-stuff");
    Ok(())
}

#[tokio::test]
async fn messages_reactions_and_timeline() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.register("poster@example.com", "Poster").await?;
    let (workspace_id, _, channel_id) = ctx.workspace(&token, "Acme").await?;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/messages",
            Some(&token),
            Some(json!({ "workspace_id": workspace_id, "channel_id": channel_id, "text": "   " })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, message) = ctx
        .send(
            Method::POST,
            "/api/messages",
            Some(&token),
            Some(json!({ "workspace_id": workspace_id, "channel_id": channel_id, "text": "hello" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = message["id"].as_str().unwrap().to_string();

    let reaction_uri = format!("/api/messages/{message_id}/reactions");
    let (status, toggle) = ctx
        .send(Method::POST, &reaction_uri, Some(&token), Some(json!({ "emoji": "👍" })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggle["added"], true);

    let list_uri = format!("/api/messages?workspace_id={workspace_id}&channel_id={channel_id}");
    let (status, page) = ctx.send(Method::GET, &list_uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["is_done"], true);
    assert_eq!(page["page"][0]["text"], "hello");
    assert_eq!(page["page"][0]["reactions"][0]["count"], 1);

    let (status, _) = ctx
        .send(Method::GET, &format!("{list_uri}&cursor=!!!"), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let timeline_uri = format!("/api/timeline?workspace_id={workspace_id}&channel_id={channel_id}");
    let (status, timeline) = ctx.send(Method::GET, &timeline_uri, Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timeline["groups"][0]["label"], "Today");
    assert_eq!(timeline["groups"][0]["messages"][0]["is_compact"], false);

    let (status, edited) = ctx
        .send(
            Method::PATCH,
            &format!("/api/messages/{message_id}"),
            Some(&token),
            Some(json!({ "text": "hello again" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["text"], "hello again");
    assert!(!edited["updated_at"].is_null());

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/api/messages/{message_id}"), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(Method::GET, &format!("/api/messages/{message_id}"), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn upload_then_download_without_auth() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.register("files@example.com", "Files").await?;

    let (status, attachment) = ctx.upload(&token, "dot.png", "image/png", "PNGDATA").await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attachment["kind"], "image");

    let file_id = attachment["id"].as_str().unwrap();
    assert_eq!(
        attachment["url"],
        format!("http://huddle.test/api/files/{file_id}")
    );

    let request = Request::builder()
        .uri(format!("/api/files/{file_id}"))
        .body(Body::empty())?;
    let response = ctx.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers()[CONTENT_DISPOSITION]
        .to_str()?
        .starts_with("inline;"));
    let bytes = response.into_body().collect().await?.to_bytes();
    assert_eq!(&bytes[..], b"PNGDATA");

    let (status, _) = ctx
        .send(Method::GET, "/api/files/not-a-storage-id", None, None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn declared_html_is_served_as_a_plain_text_download() -> TestResult {
    let ctx = TestContext::new().await?;
    let token = ctx.register("mallory@example.com", "Mallory").await?;

    let (status, attachment) = ctx
        .upload(&token, "notes.txt", "text/html", "<script>alert(1)</script>")
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attachment["kind"], "document");
    let file_id = attachment["id"].as_str().unwrap();

    let request = Request::builder()
        .uri(format!("/api/files/{file_id}"))
        .body(Body::empty())?;
    let response = ctx.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers[CONTENT_TYPE], "text/plain");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(
        headers[CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    Ok(())
}

fn ws_handshake(uri: &str) -> TestResult<Request<Body>> {
    Ok(Request::builder()
        .uri(uri)
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-version", "13")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .body(Body::empty())?)
}

#[tokio::test]
async fn websocket_rejects_bad_credentials_before_upgrading() -> TestResult {
    let ctx = TestContext::new().await?;
    let owner = ctx.register("owner@example.com", "Owner").await?;
    let outsider = ctx.register("outsider@example.com", "Outsider").await?;
    let (workspace_id, _, _) = ctx.workspace(&owner, "Acme").await?;

    let cases = [
        (format!("/ws?workspace_id={workspace_id}"), StatusCode::UNAUTHORIZED),
        (
            format!("/ws?workspace_id={workspace_id}&token=not-a-session"),
            StatusCode::UNAUTHORIZED,
        ),
        (
            format!("/ws?workspace_id={workspace_id}&token={outsider}"),
            StatusCode::FORBIDDEN,
        ),
    ];
    for (uri, expected) in cases {
        let response = ctx.router.clone().oneshot(ws_handshake(&uri)?).await?;
        assert_eq!(response.status(), expected, "{uri}");
    }

    // A member passes every check; only the in-memory transport cannot upgrade.
    let uri = format!("/ws?workspace_id={workspace_id}&token={owner}");
    let response = ctx.router.clone().oneshot(ws_handshake(&uri)?).await?;
    assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    Ok(())
}

/// Read one unmasked server frame and return its opcode and payload.
async fn read_frame(stream: &mut tokio::net::TcpStream) -> TestResult<(u8, Vec<u8>)> {
    use tokio::io::AsyncReadExt;

    let mut head = [0u8; 2];
    stream.read_exact(&mut head).await?;
    let len = match head[1] & 0x7f {
        126 => stream.read_u16().await? as usize,
        127 => stream.read_u64().await? as usize,
        len => len as usize,
    };
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok((head[0] & 0x0f, payload))
}

#[tokio::test]
async fn websocket_members_receive_posted_messages() -> TestResult {
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let ctx = TestContext::new().await?;
    let token = ctx.register("live@example.com", "Live").await?;
    let (workspace_id, _, channel_id) = ctx.workspace(&token, "Acme").await?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = ctx.router.clone();
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let mut stream = tokio::net::TcpStream::connect(addr).await?;
    let handshake = format!(
        "GET /ws?workspace_id={workspace_id}&token={token} HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
    );
    stream.write_all(handshake.as_bytes()).await?;

    // Byte at a time so no frame data is swallowed with the headers.
    let mut response = Vec::new();
    while !response.ends_with(b"\r\n\r\n") {
        response.push(stream.read_u8().await?);
    }
    let response = String::from_utf8(response)?;
    assert!(response.starts_with("HTTP/1.1 101"), "{response}");

    let (status, _) = ctx
        .send(
            Method::POST,
            "/api/messages",
            Some(&token),
            Some(json!({ "workspace_id": workspace_id, "channel_id": channel_id, "text": "over the wire" })),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (opcode, payload) =
        tokio::time::timeout(Duration::from_secs(5), read_frame(&mut stream)).await??;
    assert_eq!(opcode, 0x1);
    let event: Value = serde_json::from_slice(&payload)?;
    assert_eq!(event["type"], "message_created");
    assert_eq!(event["workspace_id"], workspace_id);
    assert_eq!(event["data"]["message"]["text"], "over the wire");

    server.abort();
    Ok(())
}
