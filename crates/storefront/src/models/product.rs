//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use canteen_core::{Price, ProductId, Stock};

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;

/// Errors from product input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductInputError {
    /// The name is blank.
    #[error("product name is required")]
    EmptyName,
    /// The name exceeds [`MAX_PRODUCT_NAME_LENGTH`].
    #[error("product name must be at most {MAX_PRODUCT_NAME_LENGTH} characters")]
    NameTooLong,
}

/// A menu item and its shelf stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Units available for reservation.
    pub stock: Stock,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product last changed.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether any units are left on the shelf.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock.get() > 0
    }
}

/// Data for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    /// Display name (trimmed, non-empty).
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Initial stock.
    pub stock: Stock,
}

impl NewProduct {
    /// Validate a new product.
    ///
    /// # Errors
    ///
    /// Returns `ProductInputError` if the name is blank or too long.
    pub fn new(name: &str, price: Price, stock: Stock) -> Result<Self, ProductInputError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductInputError::EmptyName);
        }
        if name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            return Err(ProductInputError::NameTooLong);
        }

        Ok(Self {
            name: name.to_owned(),
            price,
            stock,
        })
    }
}
