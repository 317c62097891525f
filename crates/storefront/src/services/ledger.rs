//! Inventory ledger.
//!
//! The only code that moves units between a product's stock and the carts.
//! Both operations lock the product row in the caller's unit of work, apply
//! [`canteen_core::ledger`] arithmetic and write the new stock back, so the
//! check and the decrement cannot be split by a concurrent request.

use thiserror::Error;
use tracing::instrument;

use canteen_core::{LedgerError, ProductId, Quantity, ledger};

use crate::db::RepositoryError;
use crate::models::Product;
use crate::store::UnitOfWork;

/// Errors from reserve and release.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Refused by the ledger rules (insufficient stock or overflow).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Take `amount` units of a product off the shelf.
///
/// Returns the product with its new stock. Nothing is written when the
/// reservation is refused.
///
/// # Errors
///
/// Returns `InventoryError::Ledger(InsufficientStock)` when `amount` exceeds
/// the stock and `InventoryError::ProductNotFound` for an unknown product.
#[instrument(skip_all, fields(product_id = %product_id, amount = %amount))]
pub async fn reserve<U: UnitOfWork>(
    uow: &mut U,
    product_id: ProductId,
    amount: Quantity,
) -> Result<Product, InventoryError> {
    let product = uow
        .lock_product(product_id)
        .await?
        .ok_or(InventoryError::ProductNotFound(product_id))?;

    let remaining = ledger::reserve(product.stock, amount).inspect_err(|e| {
        tracing::info!(available = %product.stock, error = %e, "Reservation refused");
    })?;

    let updated = uow.set_stock(product_id, remaining).await?;
    tracing::debug!(stock = %updated.stock, "Stock reserved");
    Ok(updated)
}

/// Put `amount` units of a product back on the shelf.
///
/// # Errors
///
/// Returns `InventoryError::ProductNotFound` for an unknown product and
/// `InventoryError::Ledger(Overflow)` if the stock would not fit.
#[instrument(skip_all, fields(product_id = %product_id, amount = %amount))]
pub async fn release<U: UnitOfWork>(
    uow: &mut U,
    product_id: ProductId,
    amount: Quantity,
) -> Result<Product, InventoryError> {
    let product = uow
        .lock_product(product_id)
        .await?
        .ok_or(InventoryError::ProductNotFound(product_id))?;

    let restored = ledger::release(product.stock, amount)?;

    let updated = uow.set_stock(product_id, restored).await?;
    tracing::debug!(stock = %updated.stock, "Stock released");
    Ok(updated)
}
