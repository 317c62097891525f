//! Cart line domain type.

use chrono::{DateTime, Utc};

use canteen_core::{CartLineId, ProductId, Quantity, UserId};

/// Units of one product reserved by one user.
///
/// There is at most one line per (user, product); repeated additions merge
/// into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// Owner of the line.
    pub user_id: UserId,
    /// Product held by the line.
    pub product_id: ProductId,
    /// Units reserved, always positive.
    pub quantity: Quantity,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
    /// When the quantity last changed.
    pub updated_at: DateTime<Utc>,
}
