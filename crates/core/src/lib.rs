//! Dessert Shop Core - Shared domain types.
//!
//! Used by:
//! - `storefront` - The web application (auth, CSRF, cart)
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! The optional `postgres` feature adds sqlx column impls so the types bind
//! directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, account identifiers and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
