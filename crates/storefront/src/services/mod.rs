//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password login, registration and bearer tokens
//! - `csrf` - Single-use anti-forgery tokens
//! - `cart` - Cart mutations and the cart view
//! - `catalog` - Product listing and lookup

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod csrf;
