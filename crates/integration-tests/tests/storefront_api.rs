//! Storefront JSON API over HTTP.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database
//! - The storefront running with `SECURE_COOKIES=false`
//!
//! Run with: cargo test -p dessert-shop-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use dessert_shop_integration_tests::ApiClient;

async fn first_product_id(client: &mut ApiClient) -> i64 {
    let body: Value = client.get("/products").await.json().await.unwrap();
    body["data"][0]["id"]
        .as_i64()
        .expect("catalog is empty; run `ds-cli seed products` first")
}

#[tokio::test]
#[ignore = "Requires running storefront and PostgreSQL"]
async fn test_health_and_readiness() {
    let mut client = ApiClient::new();

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = client.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and PostgreSQL"]
async fn test_sign_up_and_cart_lifecycle() {
    let mut client = ApiClient::new();
    client.sign_up().await;
    let product_id = first_product_id(&mut client).await;

    for expected in [1, 2] {
        client.refresh_csrf_token().await;
        let response = client.post("/cart", &json!({"productId": product_id})).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["data"]["quantity"], expected);
    }

    client.refresh_csrf_token().await;
    let response = client.get("/confirm-order").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["totalQuantity"], 2);

    let response = client.post("/checkout", &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["itemsCleared"], 1);

    client.refresh_csrf_token().await;
    let response = client.post("/checkout", &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront and PostgreSQL"]
async fn test_concurrent_adds_are_all_counted() {
    let mut client = ApiClient::new();
    let username = client.sign_up().await;
    let product_id = first_product_id(&mut client).await;

    // Fresh sessions for the same account, each holding its own CSRF token
    let mut clients = Vec::new();
    for _ in 0..5 {
        let mut other = ApiClient::new();
        other.get("/").await;
        let response = other
            .post(
                "/login",
                &json!({"contact": username, "password": dessert_shop_integration_tests::PASSWORD}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        clients.push(other);
    }

    let handles: Vec<_> = clients
        .into_iter()
        .map(|mut other| {
            tokio::spawn(async move {
                other
                    .post("/cart", &json!({"productId": product_id}))
                    .await
                    .status()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::CREATED);
    }

    let body: Value = client.get("/cart").await.json().await.unwrap();
    assert_eq!(body["data"]["lines"][0]["item"]["quantity"], 5);
}

#[tokio::test]
#[ignore = "Requires running storefront and PostgreSQL"]
async fn test_post_without_csrf_token_is_rejected() {
    let mut client = ApiClient::new();
    client.get("/").await;

    let response = client
        .post("/login", &json!({"contact": "nobody-here", "password": "whatever"}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The token was spent by the failed login; nothing replaces it until a
    // safe request
    let response = client
        .post("/login", &json!({"contact": "nobody-here", "password": "whatever"}))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = reqwest::Client::new()
        .post(format!(
            "{}/login",
            dessert_shop_integration_tests::storefront_base_url()
        ))
        .header("accept", "application/json")
        .json(&json!({"contact": "nobody-here", "password": "whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
