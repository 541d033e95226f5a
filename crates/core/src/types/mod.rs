//! Domain types shared by the storefront and its tooling.

pub mod account;
pub mod id;
pub mod price;

pub use account::{Email, EmailError, LoginIdentifier, Username, UsernameError};
pub use id::*;
pub use price::{NegativePrice, Price};
