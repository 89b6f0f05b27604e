#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use guest_checkin::client::ApiClient;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const ORGANIZER: (&str, &str) = ("organizer@example.com", "password");
pub const OTHER_ORGANIZER: (&str, &str) = ("other@example.com", "hunter22");

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory store and auth so the suite needs no external services
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_guest-checkin"));
        cmd.env("APP_ENV", "development")
            .env("CHECKIN_PORT", port.to_string())
            .env("CHECKIN_BACKEND", "memory")
            .env("AUTH_URL", "")
            .env("AUTH_JWT_SECRET", "integration-test-secret")
            .env(
                "CHECKIN_DEV_USERS",
                format!("{}:{},{}:{}", ORGANIZER.0, ORGANIZER.1, OTHER_ORGANIZER.0, OTHER_ORGANIZER.1),
            )
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Sign in over HTTP and return the bearer token
pub async fn login(server: &TestServer, (email, password): (&str, &str)) -> Result<String> {
    let res = reqwest::Client::new()
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

    let body = res.json::<Value>().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("login response had no token")
}

/// Signed-in client whose organizer already has a display name
pub async fn ready_client(server: &TestServer, account: (&str, &str)) -> Result<ApiClient> {
    let token = login(server, account).await?;
    let client = ApiClient::new(server.base_url.clone(), Some(token))?;
    if client.display_name().await?.is_none() {
        client.set_display_name("Test Organizer").await?;
    }
    Ok(client)
}
