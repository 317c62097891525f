//! Admin panel route handlers.
//!
//! Every handler requires the admin role. Stock changes made here overwrite
//! the shelf level directly and do not go through cart reservations.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use canteen_core::{Price, ProductId, Stock};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, User};
use crate::services::{AuthService, CatalogError, CatalogService, InventoryLine};
use crate::state::AppState;

use super::home::MessageQuery;

/// New product form data.
#[derive(Debug, Deserialize)]
pub struct NewProductForm {
    pub name: String,
    pub price: String,
    pub quantity: String,
}

/// Set-quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: String,
}

/// Admin panel template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub user: Option<User>,
    pub inventory: Vec<InventoryLine>,
    pub users: Vec<User>,
}

impl AdminIndexTemplate {
    /// Products with nothing left on the shelf.
    #[must_use]
    pub fn out_of_stock(&self) -> usize {
        self.inventory
            .iter()
            .filter(|line| !line.product.in_stock())
            .count()
    }
}

/// Inventory page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub user: Option<User>,
    pub inventory: Vec<InventoryLine>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// User list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct AdminUsersTemplate {
    pub user: Option<User>,
    pub users: Vec<User>,
}

/// Human-readable text for an inventory page message code.
fn products_message(code: &str) -> &'static str {
    match code {
        "created" => "Product created.",
        "updated" => "Stock updated.",
        "deleted" => "Product deleted.",
        "invalid_name" => "Name must be 1 to 200 characters.",
        "invalid_price" => "Price must be between 0 and 99999999.99 with at most two decimals.",
        "invalid_quantity" => "Quantity must be a whole number of zero or more.",
        "not_found" => "That product no longer exists.",
        "rejected" => "The product's values are out of range.",
        _ => "Something went wrong.",
    }
}

fn parse_stock(raw: &str) -> Option<Stock> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| Stock::try_from(n).ok())
}

/// Admin panel overview.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<AdminIndexTemplate> {
    let inventory = CatalogService::new(state.store()).inventory().await?;
    let users = AuthService::new(state.store()).list_users().await?;

    Ok(AdminIndexTemplate {
        user: Some(admin),
        inventory,
        users,
    })
}

/// Inventory with reserved quantities.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<MessageQuery>,
) -> Result<AdminProductsTemplate> {
    let inventory = CatalogService::new(state.store()).inventory().await?;

    Ok(AdminProductsTemplate {
        user: Some(admin),
        inventory,
        error: query
            .error
            .as_deref()
            .map(|code| products_message(code).to_string()),
        success: query
            .success
            .as_deref()
            .map(|code| products_message(code).to_string()),
    })
}

/// Create a product.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<NewProductForm>,
) -> Result<Redirect> {
    let Ok(price) = form.price.parse::<Price>() else {
        return Ok(Redirect::to("/admin/products?error=invalid_price"));
    };
    let Some(stock) = parse_stock(&form.quantity) else {
        return Ok(Redirect::to("/admin/products?error=invalid_quantity"));
    };
    let Ok(product) = NewProduct::new(&form.name, price, stock) else {
        return Ok(Redirect::to("/admin/products?error=invalid_name"));
    };

    let created = match CatalogService::new(state.store())
        .create_product(&product)
        .await
    {
        Ok(created) => created,
        Err(CatalogError::Rejected(_)) => {
            return Ok(Redirect::to("/admin/products?error=rejected"));
        }
        Err(e) => return Err(e.into()),
    };

    let id = created.id.to_string();
    add_breadcrumb("admin", "Product created", Some(&[("product_id", id.as_str())]));
    Ok(Redirect::to("/admin/products?success=created"))
}

/// Overwrite a product's stock level.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    let Some(stock) = parse_stock(&form.quantity) else {
        return Ok(Redirect::to("/admin/products?error=invalid_quantity"));
    };

    match CatalogService::new(state.store()).set_quantity(id, stock).await {
        Ok(_) => Ok(Redirect::to("/admin/products?success=updated")),
        Err(CatalogError::ProductNotFound(_)) => {
            Ok(Redirect::to("/admin/products?error=not_found"))
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// Delete a product. Cart lines holding it are removed with it.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match CatalogService::new(state.store()).delete_product(id).await {
        Ok(()) => Ok(Redirect::to("/admin/products?success=deleted")),
        Err(CatalogError::ProductNotFound(_)) => {
            Ok(Redirect::to("/admin/products?error=not_found"))
        }
        Err(e) => Err(AppError::from(e)),
    }
}

/// List registered users.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<AdminUsersTemplate> {
    let users = AuthService::new(state.store()).list_users().await?;

    Ok(AdminUsersTemplate {
        user: Some(admin),
        users,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use askama::Template;
    use canteen_core::{Email, Price, ProductId, Role, UserId};
    use chrono::Utc;

    use super::*;
    use crate::models::{Product, Profile};

    fn account(id: i32, email: &str, role: Role) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse(email).unwrap(),
            profile: Profile::new("Anna", "Smirnova", "555-0101", "female").unwrap(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(id: i32, name: &str, stock: i32, reserved: i64) -> InventoryLine {
        InventoryLine {
            product: Product {
                id: ProductId::new(id),
                name: name.to_owned(),
                price: Price::from_cents(450).unwrap(),
                stock: Stock::new(stock).unwrap(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            reserved,
        }
    }

    #[test]
    fn test_panel_lists_products_and_users() {
        let panel = AdminIndexTemplate {
            user: Some(account(1, "admin@canteen.test", Role::Admin)),
            inventory: vec![line(1, "Borscht", 12, 3), line(2, "Kvass", 0, 4)],
            users: vec![
                account(1, "admin@canteen.test", Role::Admin),
                account(2, "diner@canteen.test", Role::Customer),
            ],
        };
        assert_eq!(panel.out_of_stock(), 1);

        let html = panel.render().unwrap();
        assert!(html.contains("Borscht"));
        assert!(html.contains("Kvass"));
        assert!(html.contains("$4.50"));
        assert!(html.contains("diner@canteen.test"));
        assert!(html.contains("customer"));
    }

    #[test]
    fn test_parse_stock_allows_zero() {
        assert_eq!(parse_stock("0"), Some(Stock::ZERO));
        assert!(parse_stock("-1").is_none());
        assert!(parse_stock("lots").is_none());
    }

    #[test]
    fn test_unknown_message_code() {
        assert_eq!(products_message("nope"), "Something went wrong.");
    }
}
