//! Storage for the storefront.
//!
//! # Tables
//!
//! - `users` - Accounts with argon2 password hashes
//! - `products`, `product_images` - The catalog
//! - `cart_items` - One row per (user, product), `quantity >= 1`
//! - `tower_sessions.session` - Session blobs (created by the session store)
//!
//! # Store traits
//!
//! Services talk to storage through [`UserStore`], [`ProductStore`] and
//! [`CartStore`]. The `PostgreSQL` repositories are the production
//! implementation; [`memory::InMemoryStore`] backs tests and local demos.
//! Both report uniqueness violations as
//! [`RepositoryError::ConstraintViolation`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p dessert-shop-cli -- migrate
//! ```

pub mod cart;
pub mod memory;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use dessert_shop_core::{CartItemId, LoginIdentifier, ProductId, UserId};

use crate::models::cart::{CartItem, CartRow};
use crate::models::product::Product;
use crate::models::user::{NewUser, User, UserCredentials};

pub use cart::CartRepository;
pub use memory::InMemoryStore;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Which uniqueness rule a write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Username,
    Email,
    /// A second row for the same (user, product) pair.
    CartLine,
    Other,
}

impl ConstraintKind {
    /// Map a `PostgreSQL` constraint name to its kind.
    #[must_use]
    pub fn from_constraint(name: Option<&str>) -> Self {
        match name {
            Some("users_username_key") => Self::Username,
            Some("users_email_key") => Self::Email,
            Some("cart_items_user_product_key") => Self::CartLine,
            _ => Self::Other,
        }
    }
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("constraint violation: {0:?}")]
    ConstraintViolation(ConstraintKind),
}

impl RepositoryError {
    /// Classify a sqlx error, turning unique violations into
    /// [`RepositoryError::ConstraintViolation`].
    #[must_use]
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::ConstraintViolation(ConstraintKind::from_constraint(db_err.constraint()));
        }
        Self::Database(err)
    }
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an account.
    ///
    /// Fails with `ConstraintViolation(Username | Email)` when either is taken.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Look up an account and its password hash by email or username.
    async fn find_credentials(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
}

/// Read side of the catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, by id.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Cart storage. Every mutation is atomic and scoped to one user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's rows, newest first, each joined to its product if the
    /// product still exists.
    async fn rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RepositoryError>;

    /// Add one unit of a product, creating the row on first add.
    ///
    /// Fails with `NotFound` if the product does not exist, before touching
    /// the cart.
    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartItem, RepositoryError>;

    /// Remove one unit of a product. Returns the updated row, or `None` when
    /// the last unit was removed and the row deleted.
    ///
    /// Fails with `NotFound` if the user has no row for the product.
    async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Delete a row owned by the user. Returns `false` when no such row
    /// exists for this user.
    async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError>;

    /// Delete all of the user's rows, returning how many were removed.
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

/// The stores the application runs against.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
}

impl Repositories {
    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            products: Arc::new(ProductRepository::new(pool.clone())),
            carts: Arc::new(CartRepository::new(pool.clone())),
        }
    }

    /// All three stores backed by one in-memory store.
    #[must_use]
    pub fn in_memory(store: &Arc<InMemoryStore>) -> Self {
        Self {
            users: store.clone(),
            products: store.clone(),
            carts: store.clone(),
        }
    }
}

/// Errors from [`run_migrations`].
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("schema migration failed: {0}")]
    Schema(#[from] sqlx::migrate::MigrateError),

    #[error("session store migration failed: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the storefront schema and create the session table.
///
/// # Errors
///
/// Returns `MigrationError` if either step fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    PostgresStore::new(pool.clone()).migrate().await?;
    Ok(())
}
