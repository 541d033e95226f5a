//! Cart service.
//!
//! Every operation is scoped to one authenticated user. Atomicity lives in
//! the store; this layer turns store outcomes into cart sentinels.

use thiserror::Error;

use dessert_shop_core::{CartItemId, ProductId, UserId};

use crate::db::{CartStore, RepositoryError};
use crate::models::cart::{Cart, CartItem};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("product not found")]
    ProductNotFound,

    #[error("cart item not found")]
    CartItemNotFound,

    /// Checkout attempted on an empty cart.
    #[error("no cart items found")]
    NoCartItemsFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CartService<'a> {
    carts: &'a dyn CartStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(carts: &'a dyn CartStore) -> Self {
        Self { carts }
    }

    /// The user's cart joined against the catalog.
    ///
    /// Lines whose product has gone away are reported in
    /// [`Cart::unavailable`] instead of failing the whole cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let rows = self.carts.rows(user_id).await?;
        let cart = Cart::from_rows(rows);

        for line in &cart.unavailable {
            tracing::warn!(
                user_id = %user_id,
                cart_item_id = %line.item.id,
                product_id = %line.item.product_id,
                "cart line references a missing product"
            );
        }

        Ok(cart)
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartItem, CartError> {
        self.carts
            .add_item(user_id, product_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                other => CartError::Repository(other),
            })
    }

    /// Remove one unit of a product, deleting the line at zero.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartItemNotFound` if the product is not in the cart.
    pub async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, CartError> {
        self.carts
            .decrement_item(user_id, product_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::CartItemNotFound,
                other => CartError::Repository(other),
            })
    }

    /// Delete a whole line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartItemNotFound` if the line does not exist or
    /// belongs to someone else.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<(), CartError> {
        if self.carts.remove_item(user_id, item_id).await? {
            Ok(())
        } else {
            Err(CartError::CartItemNotFound)
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoCartItemsFound` if the cart was already empty.
    pub async fn checkout(&self, user_id: UserId) -> Result<u64, CartError> {
        match self.carts.clear(user_id).await? {
            0 => Err(CartError::NoCartItemsFound),
            removed => {
                tracing::info!(user_id = %user_id, lines = removed, "checked out");
                Ok(removed)
            }
        }
    }
}
