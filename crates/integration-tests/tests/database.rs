//! Store behaviour against a real `PostgreSQL` database.
//!
//! These tests require a migrated database in `STOREFRONT_DATABASE_URL`.
//!
//! Run with: cargo test -p dessert-shop-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use dessert_shop_core::{Email, Price, Username};
use dessert_shop_integration_tests::{storefront_pool, unique_suffix};
use dessert_shop_storefront::db::{
    CartRepository, CartStore, ConstraintKind, ProductRepository, RepositoryError, UserRepository,
    UserStore,
};
use dessert_shop_storefront::models::{NewProduct, NewUser, Product, User};
use sqlx::PgPool;

async fn create_user(pool: &PgPool) -> User {
    let username = format!("db{}", unique_suffix());
    UserRepository::new(pool.clone())
        .create(&NewUser {
            username: Username::parse(&username).unwrap(),
            email: Email::parse(&format!("{username}@integration.test")).unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        })
        .await
        .unwrap()
}

async fn create_product(pool: &PgPool) -> Product {
    ProductRepository::new(pool.clone())
        .create(&NewProduct {
            title: format!("Test Eclair {}", unique_suffix()),
            category: "Eclair".to_string(),
            description: String::new(),
            price: Price::from_cents(375),
            thumbnail: String::new(),
            images: vec!["/images/eclair-1.jpg".to_string(), "/images/eclair-2.jpg".to_string()],
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_duplicate_accounts_are_classified() {
    let pool = storefront_pool().await;
    let user = create_user(&pool).await;
    let users = UserRepository::new(pool.clone());

    let err = users
        .create(&NewUser {
            username: user.username.clone(),
            email: Email::parse(&format!("other{}@integration.test", unique_suffix())).unwrap(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ConstraintViolation(ConstraintKind::Username)
    ));

    let err = users
        .create(&NewUser {
            username: Username::parse(&format!("other{}", unique_suffix())).unwrap(),
            email: user.email.clone(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::ConstraintViolation(ConstraintKind::Email)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_product_images_round_trip_in_order() {
    let pool = storefront_pool().await;
    let product = create_product(&pool).await;
    let products = ProductRepository::new(pool.clone());

    assert!(products.exists_by_title(&product.title).await.unwrap());
    assert_eq!(
        product.images,
        vec!["/images/eclair-1.jpg", "/images/eclair-2.jpg"]
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_adds_never_lose_an_increment() {
    let pool = storefront_pool().await;
    let user = create_user(&pool).await;
    let product = create_product(&pool).await;
    let carts = Arc::new(CartRepository::new(pool.clone()));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let carts = Arc::clone(&carts);
            tokio::spawn(async move { carts.add_item(user.id, product.id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let rows = carts.rows(user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item.quantity, 20);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_cart_mutations_are_scoped_to_owner() {
    let pool = storefront_pool().await;
    let owner = create_user(&pool).await;
    let stranger = create_user(&pool).await;
    let product = create_product(&pool).await;
    let carts = CartRepository::new(pool.clone());

    let item = carts.add_item(owner.id, product.id).await.unwrap();

    assert!(!carts.remove_item(stranger.id, item.id).await.unwrap());
    assert!(matches!(
        carts.decrement_item(stranger.id, product.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert_eq!(carts.clear(stranger.id).await.unwrap(), 0);

    assert_eq!(carts.decrement_item(owner.id, product.id).await.unwrap(), None);
    assert!(carts.rows(owner.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_missing_product_is_rejected_before_touching_cart() {
    let pool = storefront_pool().await;
    let user = create_user(&pool).await;
    let carts = CartRepository::new(pool.clone());

    let err = carts
        .add_item(user.id, dessert_shop_core::ProductId::new(i32::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
    assert_eq!(carts.clear(user.id).await.unwrap(), 0);
}
