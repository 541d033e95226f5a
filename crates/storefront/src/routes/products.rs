//! Product route handlers.
//!
//! The catalogue is read-only and always answered as JSON.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use dessert_shop_core::ProductId;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;

pub const INVALID_PRODUCT_ID: &str = "Invalid Product ID";

/// Parse a product id path segment.
pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    ProductId::parse(raw).map_err(|_| AppError::BadRequest(INVALID_PRODUCT_ID.to_string()))
}

/// List every product.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = state.catalog().list().await?;
    Ok(response::success(StatusCode::OK, "Fetched Products", products))
}

/// Show one product with its images.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_product_id(&id)?;

    let product = state.catalog().get(id).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound("product not found".to_string()),
        other => other.into(),
    })?;

    Ok(response::success(StatusCode::OK, "Fetched Product", product))
}
