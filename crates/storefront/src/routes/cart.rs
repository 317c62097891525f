//! Cart page route handlers.
//!
//! Form posts redirect back to a page; refusals that the customer can act on
//! (not enough stock, bad quantity) are shown on the menu instead of as an
//! error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use canteen_core::{CartLineId, CartSnapshot, ProductId, Quantity};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::{CartError, CartService};
use crate::state::AppState;

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    /// Raw quantity; parsed so a bad value can be reported on the menu.
    pub quantity: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<User>,
    pub cart: CartSnapshot,
}

/// Parse a submitted quantity.
pub(crate) fn parse_quantity(raw: &str) -> Option<Quantity> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| Quantity::try_from(n).ok())
}

/// Display the cart page.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<CartShowTemplate> {
    let cart = CartService::new(state.store()).view_cart(user.id).await?;

    Ok(CartShowTemplate {
        user: Some(user),
        cart,
    })
}

/// Reserve units of a product into the cart.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(product_id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let Some(quantity) = parse_quantity(&form.quantity) else {
        return Ok(Redirect::to("/menu?error=invalid_quantity").into_response());
    };

    let product = product_id.to_string();
    let amount = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[("product_id", product.as_str()), ("quantity", amount.as_str())]),
    );

    match CartService::new(state.store())
        .add_to_cart(user.id, product_id, quantity)
        .await
    {
        Ok(_) => Ok(Redirect::to("/cart").into_response()),
        Err(CartError::InsufficientStock { .. }) => {
            Ok(Redirect::to("/menu?error=insufficient_stock").into_response())
        }
        Err(CartError::ProductNotFound(_)) => {
            Ok(Redirect::to("/menu?error=not_found").into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(user_id = %user.id, line_id = %line_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(line_id): Path<CartLineId>,
) -> Result<Redirect> {
    let line = line_id.to_string();
    add_breadcrumb("cart", "Remove from cart", Some(&[("line_id", line.as_str())]));

    match CartService::new(state.store())
        .remove_from_cart(user.id, line_id)
        .await
    {
        // A line that is already gone leaves the cart as the user expects.
        Ok(_) | Err(CartError::LineNotFound(_)) => Ok(Redirect::to("/cart")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 ").map(Quantity::get), Some(3));
        assert!(parse_quantity("0").is_none());
        assert!(parse_quantity("-2").is_none());
        assert!(parse_quantity("two").is_none());
        assert!(parse_quantity("99999999999").is_none());
    }
}
