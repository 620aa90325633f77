#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{get_configuration, Settings};
use chirpy::startup::run;
use chirpy::store::{InMemoryStore, Repositories};
use serde_json::{json, Value};

pub const TEST_API_KEY: &str = "test-polka-key";

pub struct TestApp {
    pub address: String,
    pub settings: Settings,
    pub store: Arc<InMemoryStore>,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_on_platform("dev").await
}

pub async fn spawn_app_on_platform(platform: &str) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut settings = get_configuration().expect("Failed to read configuration.");
    settings.application.platform = platform.to_string();
    settings.application.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string();
    settings.jwt.secret = "integration-test-secret-0123456789abcdef".to_string();
    settings.webhook.api_key = TEST_API_KEY.to_string();

    let store = Arc::new(InMemoryStore::new());
    let repositories = Repositories::new(store.clone());

    let server = run(listener, repositories, settings.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        settings,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register a user and log in, returning the login response body
    pub async fn register_and_login(&self, email: &str, password: &str) -> Value {
        let response = self.post_user(email, password).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.post_login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}
