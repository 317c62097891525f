//! Cart JSON API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use canteen_core::{CartLineId, CartSnapshot, ProductId, Quantity};

use super::ApiError;
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::services::CartService;
use crate::state::AppState;

/// Request body for `POST /api/cart/lines`.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Current cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartSnapshot>, ApiError> {
    let cart = CartService::new(state.store()).view_cart(user.id).await?;
    Ok(Json(cart))
}

/// Reserve units into the cart.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<AddLineRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let quantity = Quantity::try_from(body.quantity)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let product = body.product_id.to_string();
    add_breadcrumb("cart", "Add to cart", Some(&[("product_id", product.as_str())]));

    let cart = CartService::new(state.store())
        .add_to_cart(user.id, body.product_id, quantity)
        .await?;
    Ok(Json(cart))
}

/// Remove a line and release its units.
#[instrument(skip_all, fields(user_id = %user.id, line_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<CartLineId>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let line = id.to_string();
    add_breadcrumb("cart", "Remove from cart", Some(&[("line_id", line.as_str())]));

    let cart = CartService::new(state.store())
        .remove_from_cart(user.id, id)
        .await?;
    Ok(Json(cart))
}
