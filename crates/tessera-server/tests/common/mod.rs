//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use tessera_server::{Server, ServerConfig};
use tessera_session::testing::FaultyStore;
use tessera_session::{MemoryStore, SessionManager, SessionPolicy, StaticVerifier};

/// Origin reported by every test server.
pub const TEST_ORIGIN: &str = "test-node";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Store behind the server, for failure injection.
    pub store: FaultyStore<MemoryStore>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with the default session policy.
    pub async fn start() -> Result<Self> {
        Self::start_with_policy(SessionPolicy::new()).await
    }

    /// Start a new test server with a custom session policy.
    pub async fn start_with_policy(policy: SessionPolicy) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let store = FaultyStore::new(MemoryStore::new());
        let sessions = SessionManager::new(
            StaticVerifier::demo(),
            store.clone(),
            policy.with_origin(TEST_ORIGIN),
        );
        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);

        let server = Server::new(sessions, config);
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            store,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Build a GET request.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Build a POST request.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    /// POST /login with the given credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<reqwest::Response> {
        Ok(self
            .post("/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?)
    }

    /// Log in and return the issued session identifier.
    pub async fn login_ok(&self, username: &str, password: &str) -> Result<String> {
        let resp = self.login(username, password).await?;
        anyhow::ensure!(resp.status().as_u16() == 201, "login failed: {}", resp.status());
        let body: Value = resp.json().await?;
        body["sessionID"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("no sessionID in {}", body))
    }

    /// GET /profile with the given session identifier.
    pub async fn profile(&self, session_id: &str) -> Result<reqwest::Response> {
        Ok(self
            .get("/profile")
            .header("SessionID", session_id)
            .send()
            .await?)
    }

    /// POST /refresh with the given session identifier.
    pub async fn refresh(&self, session_id: &str) -> Result<reqwest::Response> {
        Ok(self
            .post("/refresh")
            .header("SessionID", session_id)
            .send()
            .await?)
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
