//! Menu reads and admin product management.
//!
//! Admin stock changes overwrite `quantity_in_stock` directly. They do not go
//! through the ledger and do not touch cart lines.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use canteen_core::{ProductId, Stock};

use crate::db::RepositoryError;
use crate::models::{NewProduct, Product};
use crate::store::{Store, UnitOfWork};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The database refused the product's values.
    #[error("product rejected: {0}")]
    Rejected(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A product with the units currently held in carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLine {
    /// The product.
    pub product: Product,
    /// Units reserved by carts.
    pub reserved: i64,
}

/// Product operations for a single store.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CatalogService<'a, S> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Every product, for the menu page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the read fails.
    pub async fn menu(&self) -> Result<Vec<Product>, CatalogError> {
        let mut uow = self.store.begin().await?;
        let products = uow.list_products().await?;
        uow.commit().await?;
        Ok(products)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for an unknown ID.
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let mut uow = self.store.begin().await?;
        let product = uow
            .product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        uow.commit().await?;
        Ok(product)
    }

    /// Every product with its reserved units, for the admin panel.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the read fails.
    pub async fn inventory(&self) -> Result<Vec<InventoryLine>, CatalogError> {
        let mut uow = self.store.begin().await?;
        let products = uow.list_products().await?;

        let mut lines = Vec::with_capacity(products.len());
        for product in products {
            let reserved = uow.reserved_quantity(product.id).await?;
            lines.push(InventoryLine { product, reserved });
        }

        uow.commit().await?;
        Ok(lines)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Rejected` if a value breaks a column
    /// constraint and `CatalogError::Repository` if the insert fails.
    #[instrument(skip_all, fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, CatalogError> {
        let mut uow = self.store.begin().await?;
        let created = uow.insert_product(product).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => CatalogError::Rejected(msg),
            other => CatalogError::Repository(other),
        })?;
        uow.commit().await?;

        tracing::info!(product_id = %created.id, stock = %created.stock, "Product created");
        Ok(created)
    }

    /// Overwrite a product's stock.
    ///
    /// Takes the product row lock so the write orders cleanly with
    /// concurrent reservations.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for an unknown ID.
    #[instrument(skip_all, fields(product_id = %id, stock = %stock))]
    pub async fn set_quantity(&self, id: ProductId, stock: Stock) -> Result<Product, CatalogError> {
        let mut uow = self.store.begin().await?;
        let before = uow
            .lock_product(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))?;
        let updated = uow.set_stock(id, stock).await?;
        uow.commit().await?;

        tracing::info!(previous = %before.stock, "Stock overwritten by admin");
        Ok(updated)
    }

    /// Delete a product and any cart lines holding it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` for an unknown ID.
    #[instrument(skip_all, fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let mut uow = self.store.begin().await?;
        let reserved = uow.reserved_quantity(id).await?;
        uow.delete_product(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::ProductNotFound(id),
            other => CatalogError::Repository(other),
        })?;
        uow.commit().await?;

        tracing::info!(dropped_reservations = reserved, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canteen_core::Price;

    use super::*;
    use crate::store::MemoryStore;

    fn new_product(name: &str, stock: i32) -> NewProduct {
        NewProduct::new(name, Price::from_cents(100).unwrap(), Stock::new(stock).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_menu_sorted_by_name() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        catalog.create_product(&new_product("Vareniki", 1)).await.unwrap();
        catalog.create_product(&new_product("Blini", 1)).await.unwrap();

        let names: Vec<_> = catalog
            .menu()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Blini", "Vareniki"]);
    }

    #[tokio::test]
    async fn test_set_quantity_overwrites() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);
        let product = catalog.create_product(&new_product("Tea", 5)).await.unwrap();

        let updated = catalog
            .set_quantity(product.id, Stock::new(50).unwrap())
            .await
            .unwrap();
        assert_eq!(updated.stock.get(), 50);
    }

    #[tokio::test]
    async fn test_delete_unknown_product() {
        let store = MemoryStore::new();
        let catalog = CatalogService::new(&store);

        let err = catalog.delete_product(ProductId::new(1)).await.unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(_)));
    }
}
