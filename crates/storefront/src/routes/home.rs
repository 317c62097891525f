//! Home page and menu route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::{Product, User};
use crate::services::CatalogService;
use crate::state::AppState;

/// Query parameters for flash messages.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<User>,
}

/// Menu page template.
#[derive(Template, WebTemplate)]
#[template(path = "menu.html")]
pub struct MenuTemplate {
    pub user: Option<User>,
    pub products: Vec<Product>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the home page.
pub async fn home(OptionalUser(user): OptionalUser) -> HomeTemplate {
    HomeTemplate { user }
}

/// Human-readable text for a menu error code.
fn menu_error_message(code: &str) -> &'static str {
    match code {
        "insufficient_stock" => "Not enough left in stock for that amount.",
        "invalid_quantity" => "Quantity must be a whole number of at least one.",
        "not_found" => "That dish is no longer on the menu.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Display the menu with current stock levels.
#[instrument(skip_all)]
pub async fn menu(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<MessageQuery>,
) -> Result<MenuTemplate> {
    let products = CatalogService::new(state.store()).menu().await?;

    Ok(MenuTemplate {
        user,
        products,
        error: query
            .error
            .as_deref()
            .map(|code| menu_error_message(code).to_string()),
        success: query.success.map(|_| "Added to your cart.".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_error_code_is_generic() {
        assert_eq!(
            menu_error_message("<script>"),
            "Something went wrong. Please try again."
        );
        assert!(menu_error_message("insufficient_stock").contains("stock"));
    }
}
