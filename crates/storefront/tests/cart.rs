//! Catalog and cart endpoints through the router.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{PASSWORD, TestApp, body_json, body_text, location};

#[tokio::test]
async fn test_products_endpoints() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get_json("/products").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Fetched Products");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let id = app.products[0].id.as_i32();
    let response = client.get_json(&format!("/products/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], "Waffle with Berries");
    assert_eq!(body["data"]["price"], "6.50");

    let response = client.get_json("/products/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid Product ID");

    let response = client.get_json("/products/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "product not found");
}

#[tokio::test]
async fn test_unknown_path_gets_error_envelope() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get_json("/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "the requested resource could not be found");
}

#[tokio::test]
async fn test_add_accumulates_quantity() {
    let app = TestApp::new();
    app.register_user("crumble", "apple@crumble.com").await;
    let mut client = app.client();
    client.login_json("crumble").await;
    let waffle = app.products[0].id.as_i32();

    let response = client.post_json("/cart", &json!({"productId": waffle})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    assert_eq!(first["message"], "Added item to cart");
    assert_eq!(first["data"]["quantity"], 1);

    // Form-style string ids are accepted too
    client.refresh_csrf_token().await;
    let response = client
        .post_json("/cart", &json!({"productId": waffle.to_string()}))
        .await;
    let second = body_json(response).await;
    assert_eq!(second["data"]["quantity"], 2);
    assert_eq!(second["data"]["id"], first["data"]["id"]);

    client.refresh_csrf_token().await;
    let response = client.get_json("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart = body_json(response).await;
    assert_eq!(cart["message"], "Fetched Cart");
    assert_eq!(cart["data"]["lines"].as_array().unwrap().len(), 1);
    assert_eq!(cart["data"]["lines"][0]["lineTotal"], "13.00");
    assert_eq!(cart["data"]["totalPrice"], "13.00");
    assert_eq!(cart["data"]["totalQuantity"], 2);
}

#[tokio::test]
async fn test_add_rejects_bad_products() {
    let app = TestApp::new();
    app.register_user("pavlova", "pavlova@meringue.com").await;
    let mut client = app.client();
    client.login_json("pavlova").await;

    let response = client.post_json("/cart", &json!({"productId": 999})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "product not found");

    client.refresh_csrf_token().await;
    let response = client.post_json("/cart", &json!({"productId": "cake"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["data"]["productId"], "invalid productid: number");

    client.refresh_csrf_token().await;
    let response = client.post_json("/cart", &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["data"]["productId"],
        "invalid productid: required"
    );
}

#[tokio::test]
async fn test_remove_one_until_line_disappears() {
    let app = TestApp::new();
    app.register_user("trifle", "sherry@trifle.com").await;
    let mut client = app.client();
    client.login_json("trifle").await;
    let tiramisu = app.products[1].id.as_i32();

    for _ in 0..2 {
        client.post_json("/cart", &json!({"productId": tiramisu})).await;
        client.refresh_csrf_token().await;
    }

    let path = format!("/cart/product/{tiramisu}/remove-one");
    let response = client.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Product item removed");
    assert_eq!(body["data"]["quantity"], 1);

    client.refresh_csrf_token().await;
    let response = client.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].is_null());

    client.refresh_csrf_token().await;
    let response = client.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "cart item not found");

    client.refresh_csrf_token().await;
    let response = client
        .post_json("/cart/product/zero/remove-one", &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid Product ID");
}

#[tokio::test]
async fn test_delete_is_scoped_to_owner() {
    let app = TestApp::new();
    app.register_user("sachertorte", "sacher@vienna.com").await;
    app.register_user("linzertorte", "linzer@vienna.com").await;
    let waffle = app.products[0].id.as_i32();

    let mut owner = app.client();
    owner.login_json("sachertorte").await;
    let response = owner.post_json("/cart", &json!({"productId": waffle})).await;
    let item_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let path = format!("/cart/{item_id}/delete");

    let mut other = app.client();
    other.login_json("linzertorte").await;
    let response = other.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    owner.refresh_csrf_token().await;
    let response = owner.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Cart item removed");

    owner.refresh_csrf_token().await;
    let response = owner.post_json(&path, &json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    owner.refresh_csrf_token().await;
    let response = owner.post_json("/cart/abc/delete", &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid Cart Item ID");
}

#[tokio::test]
async fn test_confirm_and_checkout() {
    let app = TestApp::new();
    app.register_user("clafoutis", "cherry@clafoutis.com").await;
    let mut client = app.client();
    client.login_json("clafoutis").await;

    let response = client.get_json("/confirm-order").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "please add some items into your cart"
    );

    let response = client.post_json("/checkout", &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "no cart items found");

    for product in &app.products {
        client.refresh_csrf_token().await;
        client
            .post_json("/cart", &json!({"productId": product.id.as_i32()}))
            .await;
    }

    client.refresh_csrf_token().await;
    let response = client.get_json("/confirm-order").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Order Confirmed");
    assert_eq!(body["data"]["totalPrice"], "12.00");

    let response = client.post_json("/checkout", &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Checked out");
    assert_eq!(body["data"]["itemsCleared"], 2);

    client.refresh_csrf_token().await;
    let cart = body_json(client.get_json("/cart").await).await;
    assert!(cart["data"]["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_browser_cart_round_trip() {
    let app = TestApp::new();
    app.register_user("profiteroles", "choux@creme.com").await;
    let waffle = app.products[0].id.as_i32().to_string();
    let mut client = app.client();

    client.get_html("/login").await;
    let token = client.csrf_token.clone().unwrap();
    client
        .post_form(
            "/login",
            &[("contact", "profiteroles"), ("password", PASSWORD), ("csrf_token", &token)],
        )
        .await;

    let token = client.csrf_token.clone().unwrap();
    let response = client
        .post_form("/cart", &[("productId", &waffle), ("csrf_token", &token)])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_text(client.get_html("/").await).await;
    assert!(page.contains("Waffle with Berries"));
    assert!(page.contains("1 item"));

    // Failures come back as a flash on the home page
    let token = client.csrf_token.clone().unwrap();
    let response = client
        .post_form(
            "/cart/product/999/remove-one",
            &[("csrf_token", &token)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_text(client.get_html("/").await).await;
    assert!(page.contains("cart item not found"));
}

#[tokio::test]
async fn test_get_on_action_paths_redirects_home() {
    let app = TestApp::new();
    let mut client = app.client();

    for path in ["/checkout", "/cart/product/1/remove-one", "/cart/1/delete"] {
        let response = client.get_html(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/", "{path}");
    }
}
