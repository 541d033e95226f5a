//! Domain models for storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod cart;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, UnavailableLine};
pub use product::{NewProduct, Product, ProductSummary};
pub use session::SessionContext;
pub use user::{NewUser, User};
