//! Cart line repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use canteen_core::{CartLineId, CartLineView, Price, ProductId, Quantity, UserId};

use super::{RepositoryError, map_write_error};
use crate::models::CartLine;

#[derive(sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(row: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::new(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid quantity for line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: CartLineId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartLineViewRow {
    line_id: i32,
    product_id: i32,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

impl TryFrom<CartLineViewRow> for CartLineView {
    type Error = RepositoryError;

    fn try_from(row: CartLineViewRow) -> Result<Self, Self::Error> {
        let line_id = row.line_id;
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid cart line {line_id}: {e}"))
        };
        let unit_price = Price::new(row.unit_price).map_err(|e| corrupt(&e))?;
        let quantity = Quantity::new(row.quantity).map_err(|e| corrupt(&e))?;

        Ok(Self {
            line_id: CartLineId::new(line_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            unit_price,
            quantity,
        })
    }
}

/// Repository for cart line database operations.
///
/// Every read is scoped to one user: a line ID belonging to someone else
/// behaves exactly like a missing one.
pub struct CartLineRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CartLineRepository<'c> {
    /// Create a new cart line repository on a connection or open transaction.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get a user's line by ID without locking it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(CartLine::try_from)
        .transpose()
    }

    /// Lock a user's line by ID until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(CartLine::try_from)
        .transpose()
    }

    /// Lock the user's line for a product, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_product(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, user_id, product_id, quantity, created_at, updated_at
            FROM cart_lines
            WHERE user_id = $1 AND product_id = $2
            FOR UPDATE
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(CartLine::try_from)
        .transpose()
    }

    /// Insert a new line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a line for
    /// the product and `RepositoryError::NotFound` if the user or product is
    /// gone.
    pub async fn create(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(
            r"
            INSERT INTO cart_lines (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity.get())
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| map_write_error(e, "cart line already exists"))?
        .try_into()
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    pub async fn set_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        sqlx::query_as::<_, CartLineRow>(
            r"
            UPDATE cart_lines
            SET quantity = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(line_id)
        .bind(quantity.get())
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    pub async fn delete(&mut self, line_id: CartLineId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1")
            .bind(line_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// A user's lines joined with their products, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_view(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<CartLineView>, RepositoryError> {
        sqlx::query_as::<_, CartLineViewRow>(
            r"
            SELECT cl.id AS line_id,
                   p.id AS product_id,
                   p.name AS product_name,
                   p.price AS unit_price,
                   cl.quantity
            FROM cart_lines cl
            JOIN products p ON p.id = cl.product_id
            WHERE cl.user_id = $1
            ORDER BY cl.id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?
        .into_iter()
        .map(CartLineView::try_from)
        .collect()
    }
}
