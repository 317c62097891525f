//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use canteen_core::{Price, ProductId, Stock};

use super::{RepositoryError, map_write_error};
use crate::models::{NewProduct, Product};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    quantity_in_stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let stock = Stock::new(row.quantity_in_stock).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid stock for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> ProductRepository<'c> {
    /// Create a new product repository on a connection or open transaction.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (name, price, quantity_in_stock)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, quantity_in_stock, created_at, updated_at
            ",
        )
        .bind(&product.name)
        .bind(product.price.amount())
        .bind(product.stock.get())
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_write_error(e, "invalid product"))?
        .try_into()
    }

    /// Get a product without locking it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, quantity_in_stock, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// Get a product and hold its row lock until the transaction ends.
    ///
    /// Concurrent callers locking the same product wait here, so a stock
    /// check followed by a write cannot interleave with another one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, quantity_in_stock, created_at, updated_at
            FROM products
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(Product::try_from)
        .transpose()
    }

    /// List every product by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&mut self) -> Result<Vec<Product>, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, price, quantity_in_stock, created_at, updated_at
            FROM products
            ORDER BY name, id
            ",
        )
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect()
    }

    /// Overwrite a product's stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(
        &mut self,
        id: ProductId,
        stock: Stock,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET quantity_in_stock = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price, quantity_in_stock, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(stock.get())
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| map_write_error(e, "stock out of range"))?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Delete a product. Its cart lines go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&mut self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Units of a product currently held in carts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reserved_quantity(&mut self, id: ProductId) -> Result<i64, RepositoryError> {
        let reserved = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM cart_lines WHERE product_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(reserved)
    }
}
