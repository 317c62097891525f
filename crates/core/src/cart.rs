//! Cart snapshot view-models.
//!
//! A [`CartSnapshot`] is what every cart operation returns: the user's lines
//! joined with their products, and the total price.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CartLineId, Price, ProductId, Quantity};

/// One cart line joined with its product for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    /// Cart line ID (used to remove the line).
    pub line_id: CartLineId,
    /// Product held by the line.
    pub product_id: ProductId,
    /// Product name at read time.
    pub product_name: String,
    /// Product unit price at read time.
    pub unit_price: Price,
    /// Units reserved by the line.
    pub quantity: Quantity,
}

impl CartLineView {
    /// `quantity * unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// A user's cart at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    lines: Vec<CartLineView>,
    total_price: Decimal,
}

impl CartSnapshot {
    /// Build a snapshot, computing the total from the lines.
    #[must_use]
    pub fn new(lines: Vec<CartLineView>) -> Self {
        let total_price = lines.iter().map(CartLineView::line_total).sum();
        Self { lines, total_price }
    }

    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate over the lines.
    ///
    /// The iterator borrows the snapshot and can be cloned or recreated to
    /// walk the lines again.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &CartLineView> + Clone {
        self.lines.iter()
    }

    /// Find the line holding `product_id`.
    #[must_use]
    pub fn line_for(&self, product_id: ProductId) -> Option<&CartLineView> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// `sum(line.quantity * product.price)`.
    #[must_use]
    pub const fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity.get())).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
