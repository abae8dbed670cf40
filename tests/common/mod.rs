#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use reqwest::Response;
use serde_json::{json, Value};
use videotube::auth::{CookieSameSite, CookieSettings};
use videotube::configuration::{AuthSettings, JwtSettings};
use videotube::startup::run;
use videotube::store::InMemoryUserStore;

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryUserStore>,
    pub settings: AuthSettings,
    pub client: reqwest::Client,
}

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        jwt: JwtSettings {
            access_token_secret: "integration-access-secret-0123456789abcdef".to_string(),
            access_token_expiry: 900,
            refresh_token_secret: "integration-refresh-secret-0123456789abcdef".to_string(),
            refresh_token_expiry: 864000,
            issuer: "videotube-test".to_string(),
        },
        cookie: CookieSettings {
            secure: true,
            same_site: CookieSameSite::Lax,
        },
        // Minimum bcrypt cost keeps the suite fast
        password_hash_cost: 4,
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryUserStore::new());
    let settings = test_settings();
    let server = run(listener, store.clone(), settings.clone()).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        settings,
        client: reqwest::Client::new(),
    }
}

pub fn maulik() -> Value {
    json!({
        "username": "maulik",
        "email": "maulik@test.com",
        "password": "12345678",
        "fullName": "maulik patel",
        "avatar": "https://cdn.example.com/avatars/maulik.png"
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/users{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(&self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, body: &Value) -> Response {
        self.post_json("/register", body).await
    }

    /// Log in and return `(user id, access token, refresh token)`
    pub async fn login(&self, username: &str, password: &str) -> (String, String, String) {
        let response = self
            .post_json("/login", &json!({"username": username, "password": password}))
            .await;
        assert_eq!(200, response.status().as_u16(), "login should succeed");

        let body: Value = response.json().await.expect("Failed to parse response");
        let data = &body["data"];
        (
            data["user"]["id"].as_str().unwrap().to_string(),
            data["accessToken"].as_str().unwrap().to_string(),
            data["refreshToken"].as_str().unwrap().to_string(),
        )
    }

    pub async fn get_authorized(&self, path: &str, access_token: &str) -> Response {
        self.client
            .get(&self.url(path))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
