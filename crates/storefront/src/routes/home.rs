//! Home page route handler.
//!
//! JSON clients get a greeting. Browsers get the whole shop on one page:
//! the catalogue, the signed-in user's cart and any queued error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::models::cart::Cart;
use crate::models::product::Product;
use crate::models::session::SessionContext;
use crate::response::{self, ResponseMode};
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome To The Dessert Ordering System";

/// A catalogue entry with how many of it the user already holds.
pub struct ProductCard {
    pub product: Product,
    pub in_cart: i32,
}

/// Storefront page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub products: Vec<ProductCard>,
    pub cart: Cart,
    pub errors: Vec<String>,
    pub csrf_token: String,
    pub signed_in: bool,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
) -> Result<Response, AppError> {
    if mode.is_json() {
        return Ok(response::success_message(StatusCode::OK, WELCOME_MESSAGE));
    }

    let user_id = session.auth_user_id().await?;
    let products = state.catalog().list().await?;
    let cart = match user_id {
        Some(id) => state.cart().get_cart(id).await?,
        None => Cart::default(),
    };

    let mut errors = cart.errors();
    if let Some(flash) = session.take_flash_error().await? {
        errors.push(flash);
    }

    let products = products
        .into_iter()
        .map(|product| ProductCard {
            in_cart: cart.quantity_of(product.id),
            product,
        })
        .collect();

    Ok(IndexTemplate {
        products,
        cart,
        errors,
        csrf_token: session.csrf_token().await?.unwrap_or_default(),
        signed_in: user_id.is_some(),
    }
    .into_response())
}

/// Send a browser that refreshed after a form post back home.
pub async fn redirect_home() -> Redirect {
    Redirect::to("/")
}
