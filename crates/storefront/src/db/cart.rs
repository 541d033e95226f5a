//! Cart repository.
//!
//! Multi-step mutations run in one transaction. Rows are locked with
//! `FOR UPDATE` / `FOR SHARE` before they are read for a decision, and the
//! `(user_id, product_id)` unique constraint backs the one-row-per-product
//! rule even if two adds race.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dessert_shop_core::{CartItemId, Price, ProductId, UserId};

use super::{CartStore, RepositoryError};
use crate::models::cart::{CartItem, CartRow};
use crate::models::product::ProductSummary;

/// Repository for the `cart_items` table.
pub struct CartRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A cart row LEFT JOINed to `products`; product columns are NULL when the
/// product is gone.
#[derive(sqlx::FromRow)]
struct CartJoinRow {
    id: CartItemId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    p_id: Option<ProductId>,
    p_title: Option<String>,
    p_category: Option<String>,
    p_description: Option<String>,
    p_price: Option<Price>,
    p_thumbnail: Option<String>,
}

impl CartJoinRow {
    fn into_cart_row(self) -> CartRow {
        let product = match (self.p_id, self.p_title, self.p_price) {
            (Some(id), Some(title), Some(price)) => Some(ProductSummary {
                id,
                title,
                category: self.p_category.unwrap_or_default(),
                description: self.p_description.unwrap_or_default(),
                price,
                thumbnail: self.p_thumbnail.unwrap_or_default(),
            }),
            _ => None,
        };

        CartRow {
            item: CartItem {
                id: self.id,
                user_id: self.user_id,
                product_id: self.product_id,
                quantity: self.quantity,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            product,
        }
    }
}

impl CartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartRepository {
    async fn rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RepositoryError> {
        let rows: Vec<CartJoinRow> = sqlx::query_as(
            r"
            SELECT
                ci.id, ci.user_id, ci.product_id, ci.quantity, ci.created_at, ci.updated_at,
                p.id AS p_id,
                p.title AS p_title,
                p.category AS p_category,
                p.description AS p_description,
                p.price AS p_price,
                p.thumbnail AS p_thumbnail
            FROM cart_items AS ci
            LEFT JOIN products AS p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartJoinRow::into_cart_row).collect())
    }

    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Hold the product row so it cannot be deleted mid-add
        let product: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR SHARE")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if product.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let row: CartItemRow = sqlx::query_as(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT ON CONSTRAINT cart_items_user_product_key
            DO UPDATE SET quantity = cart_items.quantity + 1, updated_at = NOW()
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::classify)?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(CartItemId, i32)> = sqlx::query_as(
            r"
            SELECT id, quantity
            FROM cart_items
            WHERE user_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((item_id, quantity)) = current else {
            return Err(RepositoryError::NotFound);
        };

        let remaining = quantity - 1;
        let updated = if remaining < 1 {
            sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
                .bind(item_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            None
        } else {
            let row: CartItemRow = sqlx::query_as(
                r"
                UPDATE cart_items
                SET quantity = $1, updated_at = NOW()
                WHERE id = $2 AND user_id = $3
                RETURNING id, user_id, product_id, quantity, created_at, updated_at
                ",
            )
            .bind(remaining)
            .bind(item_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            Some(row.into())
        };

        tx.commit().await?;
        Ok(updated)
    }

    async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
