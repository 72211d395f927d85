#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use reqwest::Response;
use serde_json::{json, Value};

use photovault::configuration::{ApplicationSettings, AuthSettings};
use photovault::startup::run;
use photovault::store::InMemoryCredentialStore;

pub const ACCESS_KEY: &str = "integration-access-key-0123456789";
pub const REFRESH_KEY: &str = "integration-refresh-key-0123456789";

pub const EMAIL: &str = "a@x.com";
pub const NAME: &str = "Alice";
pub const PASSWORD: &str = "SecurePass123";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryCredentialStore>,
    pub client: reqwest::Client,
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        access_token_key: ACCESS_KEY.to_string(),
        refresh_token_key: REFRESH_KEY.to_string(),
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with_signup(false)
}

pub fn spawn_app_with_signup(disable_signup: bool) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let store = Arc::new(InMemoryCredentialStore::new());
    let application = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        disable_signup,
    };

    let server = run(listener, store.clone(), auth_settings(), application)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

/// Value of the `refresh` cookie set by a response, if any
pub fn refresh_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh="))
        .map(|value| {
            let pair = value.split(';').next().unwrap_or_default();
            pair.trim_start_matches("refresh=").to_string()
        })
}

/// Raw `Set-Cookie` header for the `refresh` cookie
pub fn refresh_set_cookie_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh="))
        .map(|value| value.to_string())
}

pub async fn error_code(response: Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["code"].as_str().unwrap_or_default().to_string()
}

impl TestApp {
    pub async fn create_user(&self, email: &str, name: &str, password: &str) -> Response {
        self.client
            .post(&format!("{}/user", &self.address))
            .json(&json!({ "email": email, "name": name, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(&format!("{}/login", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, cookie: Option<&str>) -> Response {
        let mut request = self.client.post(&format!("{}/refresh", &self.address));
        if let Some(token) = cookie {
            request = request.header(COOKIE, format!("refresh={}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn logout(&self, authorization: Option<&str>, cookie: Option<&str>) -> Response {
        let mut request = self.client.post(&format!("{}/logout", &self.address));
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        if let Some(token) = cookie {
            request = request.header(COOKIE, format!("refresh={}", token));
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_user(&self, email: &str, authorization: Option<&str>) -> Response {
        let mut request = self.client.get(&format!("{}/user/{}", &self.address, email));
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn delete_user(&self, authorization: Option<&str>) -> Response {
        let mut request = self.client.delete(&format!("{}/user", &self.address));
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Creates the default user and logs in; returns (access token, refresh token)
    pub async fn signed_in_user(&self) -> (String, String) {
        let created = self.create_user(EMAIL, NAME, PASSWORD).await;
        assert_eq!(201, created.status().as_u16());

        let response = self.login(EMAIL, PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let refresh = refresh_cookie(&response).expect("login should set a refresh cookie");
        let body: Value = response.json().await.expect("Failed to parse response");
        let access = body["access_token"].as_str().unwrap().to_string();

        (access, refresh)
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
