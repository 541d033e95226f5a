//! Shared harness for router tests: an app over in-memory storage and a
//! tiny client that carries cookies and the latest CSRF token between
//! requests.

#![allow(clippy::unwrap_used, dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, Response, StatusCode, header},
};
use chrono::Duration;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use dessert_shop_core::Price;
use dessert_shop_storefront::app;
use dessert_shop_storefront::config::StorefrontConfig;
use dessert_shop_storefront::db::{InMemoryStore, Repositories};
use dessert_shop_storefront::middleware::create_session_layer;
use dessert_shop_storefront::models::{NewProduct, Product, User};
use dessert_shop_storefront::services::auth::AuthService;
use dessert_shop_storefront::state::AppState;

pub const JWT_SECRET: &str = "q7Vx!2mLp9#Rt4Wz@8Ks$1Nd&6Hf*3Yb";
pub const PASSWORD: &str = "vanilla-bean";

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        jwt_secret: SecretString::from(JWT_SECRET),
        jwt_expiration: Duration::hours(1),
        secure_cookies: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_traces_sample_rate: 0.0,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub products: Vec<Product>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let products = vec![
            store.insert_product(NewProduct {
                title: "Waffle with Berries".to_string(),
                category: "Waffle".to_string(),
                description: String::new(),
                price: Price::from_cents(650),
                thumbnail: "/images/waffle.jpg".to_string(),
                images: Vec::new(),
            }),
            store.insert_product(NewProduct {
                title: "Classic Tiramisu".to_string(),
                category: "Tiramisu".to_string(),
                description: String::new(),
                price: Price::from_cents(550),
                thumbnail: "/images/tiramisu.jpg".to_string(),
                images: Vec::new(),
            }),
        ];

        let config = test_config();
        let state = AppState::with_repositories(config.clone(), Repositories::in_memory(&store));
        let router = app(state, create_session_layer(MemoryStore::default(), &config));

        Self {
            router,
            store,
            products,
        }
    }

    pub async fn register_user(&self, username: &str, email: &str) -> User {
        AuthService::new(self.store.as_ref())
            .register(username, email, PASSWORD)
            .await
            .unwrap()
    }

    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
            csrf_token: None,
        }
    }
}

/// A browser or API client with its own cookie jar.
pub struct TestClient {
    router: Router,
    pub cookies: BTreeMap<String, String>,
    pub csrf_token: Option<String>,
}

impl TestClient {
    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(&jar).unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap();
            let (name, cookie_value) = pair.split_once('=').unwrap();
            if value.contains("Max-Age=0") || cookie_value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), cookie_value.to_string());
            }
        }
        if let Some(token) = response.headers().get("x-csrf-token") {
            self.csrf_token = Some(token.to_str().unwrap().to_string());
        }

        response
    }

    /// GET as a JSON client, echoing the current CSRF token like an API
    /// client holding a bearer token has to.
    pub async fn get_json(&mut self, path: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-csrf-token", token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// GET as a browser.
    pub async fn get_html(&mut self, path: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a JSON body as a JSON client, presenting the current CSRF token
    /// in the header.
    pub async fn post_json(&mut self, path: &str, body: &Value) -> Response<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &self.csrf_token {
            builder = builder.header("x-csrf-token", token);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    /// POST a urlencoded form as a browser. The CSRF token, if any, goes in
    /// the form body only.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::ACCEPT, "text/html")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// A spent token is only replaced by a safe request; API clients call
    /// this between unsafe requests.
    pub async fn refresh_csrf_token(&mut self) {
        let response = self.get_json("/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Fetch a CSRF token with a safe request and log in over JSON.
    pub async fn login_json(&mut self, contact: &str) -> Value {
        self.get_json("/").await;
        let response = self
            .post_json("/login", &serde_json::json!({ "contact": contact, "password": PASSWORD }))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}
