//! Seed the menu from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Borscht
//!     price: "4.50"
//!     quantity: 20
//!   - name: Vareniki
//!     price: "3.75"
//!     quantity: 0
//! ```
//!
//! The whole file is validated before connecting to the database, and all
//! products are written in one transaction.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use canteen_core::{Price, Stock};
use canteen_storefront::models::NewProduct;
use canteen_storefront::store::{PgStore, Store, UnitOfWork};

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file is missing or unreadable.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The file is not valid YAML for a menu.
    #[error("Invalid menu file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more entries failed validation.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// Could not connect.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A write failed; nothing was committed.
    #[error("Database error: {0}")]
    Repository(#[from] canteen_storefront::db::RepositoryError),
}

/// Menu file layout.
#[derive(Debug, Deserialize)]
pub struct MenuFile {
    pub products: Vec<MenuEntry>,
}

/// One product as written in the file.
#[derive(Debug, Deserialize)]
pub struct MenuEntry {
    pub name: String,
    pub price: Decimal,
    pub quantity: i64,
}

/// Validate every entry, collecting all problems rather than stopping at the
/// first.
///
/// # Errors
///
/// Returns one message per invalid entry.
pub fn validate(file: &MenuFile) -> Result<Vec<NewProduct>, Vec<String>> {
    let mut products = Vec::with_capacity(file.products.len());
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in file.products.iter().enumerate() {
        let label = format!("#{} ({})", index + 1, entry.name.trim());

        let price = Price::new(entry.price).map_err(|e| format!("{label}: {e}"));
        let stock = Stock::try_from(entry.quantity).map_err(|e| format!("{label}: {e}"));

        match (price, stock) {
            (Ok(price), Ok(stock)) => match NewProduct::new(&entry.name, price, stock) {
                Ok(product) => {
                    if seen.insert(product.name.to_lowercase()) {
                        products.push(product);
                    } else {
                        errors.push(format!("{label}: duplicate name"));
                    }
                }
                Err(e) => errors.push(format!("{label}: {e}")),
            },
            (price, stock) => {
                errors.extend(price.err());
                errors.extend(stock.err());
            }
        }
    }

    if errors.is_empty() {
        Ok(products)
    } else {
        Err(errors)
    }
}

/// Load products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or the database
/// write fails.
pub async fn menu(file_path: &str, replace: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading menu from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let file: MenuFile = serde_yaml::from_str(&content)?;

    let products = match validate(&file) {
        Ok(products) => products,
        Err(errors) => {
            error!("Menu validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(SeedError::Invalid(errors.len()));
        }
    };
    info!(products = products.len(), "Menu validated");

    let store = PgStore::new(connect().await?);
    let mut uow = store.begin().await?;

    if replace {
        let existing = uow.list_products().await?;
        for product in &existing {
            uow.delete_product(product.id).await?;
        }
        info!(removed = existing.len(), "Removed existing products");
    }

    for product in &products {
        let created = uow.insert_product(product).await?;
        info!("  {} {} x{}", created.id, created.name, created.stock);
    }

    uow.commit().await?;
    info!(inserted = products.len(), "Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> MenuFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_menu() {
        let file = parse(
            r#"
products:
  - name: Borscht
    price: "4.50"
    quantity: 20
  - name: Kompot
    price: 1
    quantity: 0
"#,
        );
        let products = validate(&file).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Borscht");
        assert_eq!(products[1].stock, Stock::ZERO);
    }

    #[test]
    fn test_collects_every_error() {
        let file = parse(
            r#"
products:
  - name: ""
    price: "1.00"
    quantity: 1
  - name: Blini
    price: "-2.00"
    quantity: -1
  - name: blini
    price: "2.00"
    quantity: 1
"#,
        );
        let errors = validate(&file).unwrap_err();
        // blank name, negative price, negative stock; the third entry is
        // fine because the invalid "Blini" was never accepted
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.starts_with("#2")));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let file = parse(
            r#"
products:
  - name: Pelmeni
    price: "5.00"
    quantity: 3
  - name: pelmeni
    price: "5.00"
    quantity: 3
"#,
        );
        let errors = validate(&file).unwrap_err();
        assert_eq!(errors, vec!["#2 (pelmeni): duplicate name".to_string()]);
    }

    #[test]
    fn test_price_beyond_column_rejected() {
        let file = parse(
            r#"
products:
  - name: Caviar
    price: "100000000"
    quantity: 1
"#,
        );
        let errors = validate(&file).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("cannot exceed"));
    }
}
