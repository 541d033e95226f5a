//! Integration tests for the Dessert Shop storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a scratch database
//! cargo run -p dessert-shop-cli -- migrate
//! cargo run -p dessert-shop-cli -- seed products
//!
//! # Start the storefront with SECURE_COOKIES=false (plain HTTP)
//! cargo run -p dessert-shop-storefront
//!
//! # Run the ignored tests
//! cargo test -p dessert-shop-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - JSON API over HTTP against a running server
//! - `database` - Store behaviour against `PostgreSQL`

use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderValue},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;

/// Password used for every account the tests create.
pub const PASSWORD: &str = "integration-lemon-tart";

/// Base URL for the storefront (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Pool for the storefront database.
///
/// # Panics
///
/// Panics if `STOREFRONT_DATABASE_URL` is unset or the database is unreachable.
#[allow(clippy::expect_used)]
pub async fn storefront_pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .expect("STOREFRONT_DATABASE_URL must be set for integration tests");
    dessert_shop_storefront::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to storefront database")
}

/// A short unique suffix so concurrent runs never collide on usernames.
#[must_use]
pub fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

/// A JSON API client that keeps cookies and echoes the latest CSRF token.
pub struct ApiClient {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl ApiClient {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn new() -> Self {
        // Login and registration are rate limited per client IP; give each
        // client its own address so tests do not share a bucket
        let [a, b, c, ..] = uuid::Uuid::new_v4().into_bytes();
        let address = format!("10.{a}.{b}.{c}");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&address).expect("dotted quad is a valid header"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: storefront_base_url(),
            csrf_token: None,
        }
    }

    fn remember_token(&mut self, headers: &HeaderMap) {
        if let Some(token) = headers.get("x-csrf-token").and_then(|v| v.to_str().ok()) {
            self.csrf_token = Some(token.to_string());
        }
    }

    /// # Panics
    ///
    /// Panics if the request fails to send.
    #[allow(clippy::expect_used)]
    pub async fn get(&mut self, path: &str) -> Response {
        let mut request = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("accept", "application/json");
        if let Some(token) = &self.csrf_token {
            request = request.header("x-csrf-token", token);
        }

        let response = request.send().await.expect("GET request failed");
        self.remember_token(response.headers());
        response
    }

    /// # Panics
    ///
    /// Panics if the request fails to send.
    #[allow(clippy::expect_used)]
    pub async fn post(&mut self, path: &str, body: &Value) -> Response {
        let mut request = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("accept", "application/json")
            .json(body);
        if let Some(token) = &self.csrf_token {
            request = request.header("x-csrf-token", token);
        }

        let response = request.send().await.expect("POST request failed");
        self.remember_token(response.headers());
        response
    }

    /// Make a safe request so the session mints a new CSRF token. Unsafe
    /// requests spend the token without replacing it.
    pub async fn refresh_csrf_token(&mut self) {
        self.get("/").await;
    }

    /// Register a fresh account and log in as it. Returns the username.
    ///
    /// # Panics
    ///
    /// Panics if either step does not succeed.
    pub async fn sign_up(&mut self) -> String {
        let username = format!("it{}", unique_suffix());
        let email = format!("{username}@integration.test");

        self.get("/").await;
        let response = self
            .post(
                "/register",
                &json!({"username": username, "email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(response.status(), 201, "registration failed");

        self.refresh_csrf_token().await;
        let response = self
            .post("/login", &json!({"contact": username, "password": PASSWORD}))
            .await;
        assert_eq!(response.status(), 200, "login failed");

        username
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}
