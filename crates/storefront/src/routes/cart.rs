//! Cart route handlers.
//!
//! JSON clients get the envelope for every outcome. Browsers are always
//! sent back to the home page, with a flash message when something failed.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use tracing::instrument;

use dessert_shop_core::CartItemId;

use super::fail;
use super::products::parse_product_id;
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::session::SessionContext;
use crate::response::{self, JsonOrForm, ResponseMode};
use crate::state::AppState;
use crate::validation::AddItemForm;

pub const INVALID_CART_ITEM_ID: &str = "Invalid Cart Item ID";
pub const EMPTY_CART_MESSAGE: &str = "please add some items into your cart";

/// Where browsers land after a cart action.
const HOME: &str = "/";

/// Show the cart. Browsers see it on the home page.
#[instrument(skip(state, auth), fields(user_id = %auth.0.id))]
pub async fn show(
    State(state): State<AppState>,
    mode: ResponseMode,
    auth: RequireAuth,
) -> Result<Response, AppError> {
    if !mode.is_json() {
        return Ok(Redirect::to(HOME).into_response());
    }

    let cart = state.cart().get_cart(auth.0.id).await?;
    Ok(response::success(StatusCode::OK, "Fetched Cart", cart))
}

/// Add one unit of a product.
#[instrument(skip(state, session, auth, form), fields(user_id = %auth.0.id))]
pub async fn add(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    auth: RequireAuth,
    JsonOrForm(form): JsonOrForm<AddItemForm>,
) -> Response {
    let product_id = match form.validate() {
        Ok(id) => id,
        Err(errors) => return fail(mode, &session, errors.into(), HOME).await,
    };

    match state.cart().add_item(auth.0.id, product_id).await {
        Ok(item) => {
            add_breadcrumb(
                "cart",
                "Added item to cart",
                &[("product_id", product_id.to_string())],
            );
            if mode.is_json() {
                response::success(StatusCode::CREATED, "Added item to cart", item)
            } else {
                Redirect::to(HOME).into_response()
            }
        }
        Err(err) => fail(mode, &session, err.into(), HOME).await,
    }
}

/// Remove one unit of a product. `data` is the updated line, or `null`
/// when the last unit went and the line with it.
#[instrument(skip(state, session, auth), fields(user_id = %auth.0.id))]
pub async fn remove_one(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    auth: RequireAuth,
    Path(product_id): Path<String>,
) -> Response {
    let product_id = match parse_product_id(&product_id) {
        Ok(id) => id,
        Err(err) => return fail(mode, &session, err, HOME).await,
    };

    match state.cart().decrement_item(auth.0.id, product_id).await {
        Ok(item) if mode.is_json() => {
            response::success(StatusCode::OK, "Product item removed", item)
        }
        Ok(_) => Redirect::to(HOME).into_response(),
        Err(err) => fail(mode, &session, err.into(), HOME).await,
    }
}

/// Delete a whole cart line.
#[instrument(skip(state, session, auth), fields(user_id = %auth.0.id))]
pub async fn delete(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    auth: RequireAuth,
    Path(item_id): Path<String>,
) -> Response {
    let Ok(item_id) = CartItemId::parse(&item_id) else {
        let err = AppError::BadRequest(INVALID_CART_ITEM_ID.to_string());
        return fail(mode, &session, err, HOME).await;
    };

    match state.cart().remove_item(auth.0.id, item_id).await {
        Ok(()) if mode.is_json() => {
            response::success_message(StatusCode::OK, "Cart item removed")
        }
        Ok(()) => Redirect::to(HOME).into_response(),
        Err(err) => fail(mode, &session, err.into(), HOME).await,
    }
}

/// Preview the order before checkout. Nothing is persisted.
#[instrument(skip(state, session, auth), fields(user_id = %auth.0.id))]
pub async fn confirm_order(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    auth: RequireAuth,
) -> Response {
    let cart = match state.cart().get_cart(auth.0.id).await {
        Ok(cart) => cart,
        Err(err) => return fail(mode, &session, err.into(), HOME).await,
    };

    if cart.is_empty() {
        let err = AppError::BadRequest(EMPTY_CART_MESSAGE.to_string());
        return fail(mode, &session, err, HOME).await;
    }

    if mode.is_json() {
        response::success(StatusCode::OK, "Order Confirmed", cart)
    } else {
        Redirect::to("/#confirm-order").into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSummary {
    items_cleared: u64,
}

/// Check out: empty the cart.
#[instrument(skip(state, session, auth), fields(user_id = %auth.0.id))]
pub async fn checkout(
    State(state): State<AppState>,
    mode: ResponseMode,
    session: SessionContext,
    auth: RequireAuth,
) -> Response {
    match state.cart().checkout(auth.0.id).await {
        Ok(items_cleared) => {
            tracing::info!(items_cleared, "checked out");
            if mode.is_json() {
                response::success(
                    StatusCode::OK,
                    "Checked out",
                    CheckoutSummary { items_cleared },
                )
            } else {
                Redirect::to(HOME).into_response()
            }
        }
        Err(err) => fail(mode, &session, err.into(), HOME).await,
    }
}
