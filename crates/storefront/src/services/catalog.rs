//! Catalog read side.

use dessert_shop_core::ProductId;

use crate::db::{ProductStore, RepositoryError};
use crate::models::product::Product;

pub struct CatalogService<'a> {
    products: &'a dyn ProductStore,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(products: &'a dyn ProductStore) -> Self {
        Self { products }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products.list().await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.products.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
