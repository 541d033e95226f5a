//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::Repositories;
use crate::services::auth::{AuthService, TokenService};
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repositories: Repositories,
    tokens: TokenService,
    /// Present when running against `PostgreSQL`; used by readiness checks.
    pool: Option<PgPool>,
}

impl AppState {
    /// State backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let repositories = Repositories::postgres(&pool);
        Self::build(config, repositories, Some(pool))
    }

    /// State over arbitrary stores, with no database pool.
    #[must_use]
    pub fn with_repositories(config: StorefrontConfig, repositories: Repositories) -> Self {
        Self::build(config, repositories, None)
    }

    fn build(config: StorefrontConfig, repositories: Repositories, pool: Option<PgPool>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiration);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repositories,
                tokens,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.inner.repositories.users.as_ref())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.inner.repositories.carts.as_ref())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.inner.repositories.products.as_ref())
    }
}
