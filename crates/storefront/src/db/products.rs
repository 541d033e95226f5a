//! Product repository: catalog reads and seeding.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dessert_shop_core::{Price, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::product::{NewProduct, Product};

/// Repository for the `products` and `product_images` tables.
pub struct ProductRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    category: String,
    description: String,
    price: Price,
    thumbnail: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, images: Vec<String>) -> Product {
        Product {
            id: self.id,
            title: self.title,
            category: self.category,
            description: self.description,
            price: self.price,
            thumbnail: self.thumbnail,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    product_id: ProductId,
    image: String,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and its images in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(
            r"
            INSERT INTO products (title, category, description, price, thumbnail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, category, description, price, thumbnail, created_at, updated_at
            ",
        )
        .bind(&product.title)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.thumbnail)
        .fetch_one(&mut *tx)
        .await?;

        for image in &product.images {
            sqlx::query("INSERT INTO product_images (product_id, image) VALUES ($1, $2)")
                .bind(row.id)
                .bind(image)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row.into_product(product.images.clone()))
    }

    /// Check whether the catalog already has a product with this title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_by_title(&self, title: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE title = $1)")
                .bind(title)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r"
            SELECT id, title, category, description, price, thumbnail, created_at, updated_at
            FROM products
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let images: Vec<ImageRow> =
            sqlx::query_as("SELECT product_id, image FROM product_images ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut by_product: HashMap<ProductId, Vec<String>> = HashMap::new();
        for ImageRow { product_id, image } in images {
            by_product.entry(product_id).or_default().push(image);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(images)
            })
            .collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r"
            SELECT id, title, category, description, price, thumbnail, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let images: Vec<String> =
            sqlx::query_scalar("SELECT image FROM product_images WHERE product_id = $1 ORDER BY id")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(row.into_product(images)))
    }
}
