//! Cart types.
//!
//! `CartItem` mirrors a `cart_items` row. `Cart` is the per-request view:
//! the user's rows joined against the live catalog, never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dessert_shop_core::{CartItemId, Price, ProductId, UserId};

use super::product::ProductSummary;

/// One user's accumulated quantity of one product.
///
/// `quantity` is always at least 1; a row that would drop below that is
/// deleted instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart row as returned by the store, with the product if it still exists.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub item: CartItem,
    pub product: Option<ProductSummary>,
}

/// A cart row whose product resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item: CartItem,
    pub product: ProductSummary,
    pub line_total: Price,
}

/// A cart row whose product could not be found in the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableLine {
    pub item: CartItem,
    pub message: String,
}

/// A user's cart, newest line first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<CartLine>,
    /// Lines whose product lookup failed. They do not count toward totals.
    pub unavailable: Vec<UnavailableLine>,
    pub total_price: Price,
    pub total_quantity: i64,
}

impl Cart {
    /// Assemble the view from store rows, keeping their order.
    #[must_use]
    pub fn from_rows(rows: Vec<CartRow>) -> Self {
        let mut cart = Self::default();

        for CartRow { item, product } in rows {
            match product {
                Some(product) => {
                    let line_total = product.price.times(item.quantity);
                    cart.total_price = cart.total_price + line_total;
                    cart.total_quantity += i64::from(item.quantity);
                    cart.lines.push(CartLine {
                        item,
                        product,
                        line_total,
                    });
                }
                None => {
                    let message =
                        format!("could not retrieve product with ID: {}", item.product_id);
                    cart.unavailable.push(UnavailableLine { item, message });
                }
            }
        }

        cart
    }

    /// True when the user has no rows at all, resolvable or not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.unavailable.is_empty()
    }

    /// Quantity of `product_id` in the cart, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> i32 {
        self.lines
            .iter()
            .find(|line| line.item.product_id == product_id)
            .map_or(0, |line| line.item.quantity)
    }

    /// Messages for the unavailable lines, for display.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.unavailable.iter().map(|l| l.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i32, product_id: i32, quantity: i32) -> CartItem {
        let now = Utc::now();
        CartItem {
            id: CartItemId::new(id),
            user_id: UserId::new(1),
            product_id: ProductId::new(product_id),
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(id: i32, cents: u32) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            title: format!("Dessert {id}"),
            category: "Cake".to_string(),
            description: String::new(),
            price: Price::from_cents(cents),
            thumbnail: String::new(),
        }
    }

    #[test]
    fn test_totals_cover_resolved_lines_only() {
        let cart = Cart::from_rows(vec![
            CartRow {
                item: item(3, 5, 2),
                product: Some(product(5, 650)),
            },
            CartRow {
                item: item(2, 9, 4),
                product: None,
            },
            CartRow {
                item: item(1, 7, 1),
                product: Some(product(7, 300)),
            },
        ]);

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.total_quantity, 3);
        assert_eq!(cart.total_price, Price::from_cents(1_600));
        assert_eq!(cart.lines[0].line_total, Price::from_cents(1_300));
        assert_eq!(
            cart.errors(),
            vec!["could not retrieve product with ID: 9".to_string()]
        );
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_quantity_of() {
        let cart = Cart::from_rows(vec![CartRow {
            item: item(1, 5, 2),
            product: Some(product(5, 100)),
        }]);

        assert_eq!(cart.quantity_of(ProductId::new(5)), 2);
        assert_eq!(cart.quantity_of(ProductId::new(6)), 0);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from_rows(Vec::new());
        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Price::ZERO);
    }
}
