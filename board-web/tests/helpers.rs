//! Integration test helpers
//!
//! Spawns the real application on a random local port.

#![allow(dead_code)]

use board_client::{BoardClient, CredentialStore, HttpTransport, TransportConfig};
use board_web::{AppState, WebConfig};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use tokio::net::TcpListener;
use tracing::info;

pub const ADMIN: &str = "root";

// Initialize tracing once for all tests in a binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Running test application
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    pub fn api_url(&self) -> String {
        format!("{}/api", self.address)
    }

    pub async fn post_user(&self, name: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/users", self.api_url()))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_session(&self, name: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/sessions", self.api_url()))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_session(&self, name: &str) -> reqwest::Response {
        self.api_client
            .put(format!("{}/sessions", self.api_url()))
            .bearer_auth(name)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_as(&self, path: &str, name: Option<&str>) -> reqwest::Response {
        let mut request = self.api_client.get(format!("{}{}", self.api_url(), path));
        if let Some(name) = name {
            request = request.bearer_auth(name);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn put_role(&self, actor: &str, target: &str, role: &str) -> reqwest::Response {
        self.api_client
            .put(format!("{}/users/{}", self.api_url(), target))
            .bearer_auth(actor)
            .json(&json!({ "role": role }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register a name and sign it in once so its session is fresh
    pub async fn register_and_sign_in(&self, name: &str) {
        let response = self.post_user(name).await;
        assert_eq!(response.status().as_u16(), 201, "register {}", name);
        let response = self.post_session(name).await;
        assert_eq!(response.status().as_u16(), 200, "sign in {}", name);
    }

    /// Board client with an in-memory credential slot pointed at this app
    pub fn board_client(&self) -> BoardClient {
        let transport = HttpTransport::new(
            TransportConfig::default()
                .with_base_url(self.api_url())
                .with_timeout(5),
        )
        .expect("Failed to build transport.");
        BoardClient::new(Arc::new(transport), Arc::new(CredentialStore::in_memory()))
    }
}

pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let config = WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_name: ADMIN.to_string(),
        ..WebConfig::default()
    };

    let state = AppState::new(config);
    let app = board_web::create_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    info!("Test application listening on port {}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client: client,
        state,
    }
}
