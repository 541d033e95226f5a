//! In-memory implementation of the store traits.
//!
//! A single mutex guards all tables, so every operation is trivially atomic.
//! It enforces the same uniqueness rules and reports the same errors as the
//! `PostgreSQL` repositories, which makes it suitable for tests and for
//! running the storefront without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use dessert_shop_core::{CartItemId, LoginIdentifier, ProductId, UserId};

use super::{CartStore, ConstraintKind, ProductStore, RepositoryError, UserStore};
use crate::models::cart::{CartItem, CartRow};
use crate::models::product::{NewProduct, Product};
use crate::models::user::{NewUser, User, UserCredentials};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserCredentials>,
    products: BTreeMap<ProductId, Product>,
    cart_items: BTreeMap<CartItemId, CartItem>,
    next_user_id: i32,
    next_product_id: i32,
    next_cart_item_id: i32,
}

impl Tables {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn cart_item_for(&self, user_id: UserId, product_id: ProductId) -> Option<CartItemId> {
        self.cart_items
            .values()
            .find(|item| item.user_id == user_id && item.product_id == product_id)
            .map(|item| item.id)
    }
}

/// Process-local storage for users, products and carts.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the catalog.
    pub fn insert_product(&self, product: NewProduct) -> Product {
        let mut tables = self.tables.lock();
        let id = ProductId::new(Tables::next_id(&mut tables.next_product_id));
        let now = Utc::now();
        let product = Product {
            id,
            title: product.title,
            category: product.category,
            description: product.description,
            price: product.price,
            thumbnail: product.thumbnail,
            images: product.images,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(id, product.clone());
        product
    }

    /// Withdraw a product from the catalog without touching carts.
    pub fn delete_product(&self, id: ProductId) -> bool {
        self.tables.lock().products.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock();

        for existing in tables.users.values() {
            if existing.user.username == user.username {
                return Err(RepositoryError::ConstraintViolation(ConstraintKind::Username));
            }
            if existing.user.email == user.email {
                return Err(RepositoryError::ConstraintViolation(ConstraintKind::Email));
            }
        }

        let id = UserId::new(Tables::next_id(&mut tables.next_user_id));
        let now = Utc::now();
        let created = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_credentials(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let tables = self.tables.lock();
        let found = tables.users.values().find(|c| match identifier {
            LoginIdentifier::Email(email) => c.user.email.as_str() == email,
            LoginIdentifier::Username(name) => c.user.username.as_str() == name,
        });
        Ok(found.cloned())
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().users.get(&id).map(|c| c.user.clone()))
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.tables.lock().products.values().cloned().collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.lock().products.get(&id).cloned())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn rows(&self, user_id: UserId) -> Result<Vec<CartRow>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .cart_items
            .values()
            .rev()
            .filter(|item| item.user_id == user_id)
            .map(|item| CartRow {
                item: item.clone(),
                product: tables.products.get(&item.product_id).map(Product::summary),
            })
            .collect())
    }

    async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartItem, RepositoryError> {
        let mut tables = self.tables.lock();

        if !tables.products.contains_key(&product_id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        if let Some(id) = tables.cart_item_for(user_id, product_id)
            && let Some(item) = tables.cart_items.get_mut(&id)
        {
            item.quantity += 1;
            item.updated_at = now;
            return Ok(item.clone());
        }

        let id = CartItemId::new(Tables::next_id(&mut tables.next_cart_item_id));
        let item = CartItem {
            id,
            user_id,
            product_id,
            quantity: 1,
            created_at: now,
            updated_at: now,
        };
        tables.cart_items.insert(id, item.clone());
        Ok(item)
    }

    async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tables = self.tables.lock();

        let id = tables
            .cart_item_for(user_id, product_id)
            .ok_or(RepositoryError::NotFound)?;
        let item = tables
            .cart_items
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        if item.quantity - 1 < 1 {
            tables.cart_items.remove(&id);
            return Ok(None);
        }

        item.quantity -= 1;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        let owned = tables
            .cart_items
            .get(&item_id)
            .is_some_and(|item| item.user_id == user_id);
        if owned {
            tables.cart_items.remove(&item_id);
        }
        Ok(owned)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock();
        let before = tables.cart_items.len();
        tables.cart_items.retain(|_, item| item.user_id != user_id);
        Ok((before - tables.cart_items.len()) as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dessert_shop_core::{Email, Price, Username};

    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: Username::parse(username).unwrap(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_string(),
        }
    }

    fn cupcake() -> NewProduct {
        NewProduct {
            title: "Cupcake".to_string(),
            category: "Cake".to_string(),
            description: String::new(),
            price: Price::from_cents(450),
            thumbnail: String::new(),
            images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_are_classified() {
        let store = InMemoryStore::new();
        store.create(&new_user("janedoe", "jane@bakery.com")).await.unwrap();

        let err = store
            .create(&new_user("janedoe", "other@bakery.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::ConstraintViolation(ConstraintKind::Username)
        ));

        let err = store
            .create(&new_user("someone", "jane@bakery.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::ConstraintViolation(ConstraintKind::Email)
        ));
    }

    #[tokio::test]
    async fn test_rows_are_newest_first_and_survive_product_removal() {
        let store = InMemoryStore::new();
        let first = store.insert_product(cupcake());
        let second = store.insert_product(cupcake());
        let user = UserId::new(1);

        store.add_item(user, first.id).await.unwrap();
        store.add_item(user, second.id).await.unwrap();
        store.delete_product(first.id);

        let rows = store.rows(user).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item.product_id, second.id);
        assert!(rows[0].product.is_some());
        assert!(rows[1].product.is_none());
    }

    #[tokio::test]
    async fn test_clear_only_touches_one_user() {
        let store = InMemoryStore::new();
        let product = store.insert_product(cupcake());

        store.add_item(UserId::new(1), product.id).await.unwrap();
        store.add_item(UserId::new(2), product.id).await.unwrap();

        assert_eq!(store.clear(UserId::new(1)).await.unwrap(), 1);
        assert_eq!(store.rows(UserId::new(2)).await.unwrap().len(), 1);
    }
}
