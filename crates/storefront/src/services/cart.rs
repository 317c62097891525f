//! Cart manager.
//!
//! Every operation is one unit of work: the ledger movement and the cart
//! line change commit together or not at all, and the returned snapshot is
//! read inside the same unit of work.

use thiserror::Error;
use tracing::instrument;

use canteen_core::{
    CartLineId, CartSnapshot, LedgerError, ProductId, Quantity, Stock, UserId, ledger::merge_line,
};

use super::ledger::{self, InventoryError};
use crate::db::RepositoryError;
use crate::store::{Store, UnitOfWork};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Not enough units on the shelf. Neither stock nor cart changed.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested.
        requested: Quantity,
        /// Units on the shelf.
        available: Stock,
    },

    /// The product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The line does not exist or belongs to another user.
    #[error("cart line {0} not found")]
    LineNotFound(CartLineId),

    /// The merged line quantity or restored stock does not fit.
    #[error("quantity overflow")]
    QuantityOverflow,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<LedgerError> for CartError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientStock {
                requested,
                available,
            } => Self::InsufficientStock {
                requested,
                available,
            },
            LedgerError::Overflow => Self::QuantityOverflow,
        }
    }
}

impl From<InventoryError> for CartError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::Ledger(e) => e.into(),
            InventoryError::ProductNotFound(id) => Self::ProductNotFound(id),
            InventoryError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Cart operations for a single store.
pub struct CartService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CartService<'a, S> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Reserve `amount` units of a product into the user's cart.
    ///
    /// Merges into the user's existing line for the product, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InsufficientStock` if the shelf cannot cover
    /// `amount` and `CartError::ProductNotFound` for an unknown product. In
    /// both cases nothing changes.
    #[instrument(skip_all, fields(user_id = %user_id, product_id = %product_id, amount = %amount))]
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        amount: Quantity,
    ) -> Result<CartSnapshot, CartError> {
        let mut uow = self.store.begin().await?;

        ledger::reserve(&mut uow, product_id, amount).await?;

        match uow.lock_cart_line_for_product(user_id, product_id).await? {
            Some(line) => {
                let merged = merge_line(Some(line.quantity), amount)?;
                uow.set_cart_line_quantity(line.id, merged).await?;
            }
            None => {
                uow.insert_cart_line(user_id, product_id, amount).await?;
            }
        }

        let snapshot = CartSnapshot::new(uow.cart_view(user_id).await?);
        uow.commit().await?;

        tracing::info!(items = snapshot.item_count(), "Added to cart");
        Ok(snapshot)
    }

    /// Remove a line from the user's cart and return its units to the shelf.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the line does not exist, belongs
    /// to another user, or was already removed. Stock is released exactly
    /// once per line.
    #[instrument(skip_all, fields(user_id = %user_id, line_id = %line_id))]
    pub async fn remove_from_cart(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<CartSnapshot, CartError> {
        let mut uow = self.store.begin().await?;

        let product_id = uow
            .cart_line(user_id, line_id)
            .await?
            .ok_or(CartError::LineNotFound(line_id))?
            .product_id;

        // Product row before cart line, same order as add_to_cart.
        if uow.lock_product(product_id).await?.is_none() {
            return Err(CartError::LineNotFound(line_id));
        }
        let line = uow
            .lock_cart_line(user_id, line_id)
            .await?
            .ok_or(CartError::LineNotFound(line_id))?;

        ledger::release(&mut uow, line.product_id, line.quantity).await?;
        uow.delete_cart_line(line.id).await?;

        let snapshot = CartSnapshot::new(uow.cart_view(user_id).await?);
        uow.commit().await?;

        tracing::info!(released = %line.quantity, "Removed from cart");
        Ok(snapshot)
    }

    /// The user's current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the read fails.
    pub async fn view_cart(&self, user_id: UserId) -> Result<CartSnapshot, CartError> {
        let mut uow = self.store.begin().await?;
        let lines = uow.cart_view(user_id).await?;
        uow.commit().await?;
        Ok(CartSnapshot::new(lines))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canteen_core::{Email, Price};

    use super::*;
    use crate::models::{NewProduct, NewUser, Profile};
    use crate::store::MemoryStore;

    async fn setup(stock: i32) -> (MemoryStore, UserId, ProductId) {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let user = uow
            .insert_user(&NewUser {
                email: Email::parse("diner@canteen.test").unwrap(),
                password_hash: "unused".to_owned(),
                profile: Profile::new("Dee", "Diner", "555", "n/a").unwrap(),
            })
            .await
            .unwrap();
        let product = uow
            .insert_product(
                &NewProduct::new("Kasha", Price::from_cents(300).unwrap(), Stock::new(stock).unwrap())
                    .unwrap(),
            )
            .await
            .unwrap();
        uow.commit().await.unwrap();
        (store, user.id, product.id)
    }

    async fn stock_of(store: &MemoryStore, id: ProductId) -> i32 {
        let mut uow = store.begin().await.unwrap();
        uow.product(id).await.unwrap().unwrap().stock.get()
    }

    fn qty(n: i32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_add_creates_line_and_totals() {
        let (store, user, product) = setup(10).await;
        let carts = CartService::new(&store);

        let cart = carts.add_to_cart(user, product, qty(2)).await.unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_price(), Price::from_cents(600).unwrap().amount());
        assert_eq!(stock_of(&store, product).await, 8);
    }

    #[tokio::test]
    async fn test_add_merges_into_existing_line() {
        let (store, user, product) = setup(10).await;
        let carts = CartService::new(&store);

        carts.add_to_cart(user, product, qty(1)).await.unwrap();
        let cart = carts.add_to_cart(user, product, qty(2)).await.unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line_for(product).unwrap().quantity, qty(3));
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let (store, user, product) = setup(1).await;
        let carts = CartService::new(&store);

        let err = carts.add_to_cart(user, product, qty(2)).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock { requested, available }
                if requested == qty(2) && available.get() == 1
        ));
        assert!(carts.view_cart(user).await.unwrap().is_empty());
        assert_eq!(stock_of(&store, product).await, 1);
    }

    #[tokio::test]
    async fn test_remove_restores_stock() {
        let (store, user, product) = setup(4).await;
        let carts = CartService::new(&store);

        let cart = carts.add_to_cart(user, product, qty(4)).await.unwrap();
        let line_id = cart.line_for(product).unwrap().line_id;

        let cart = carts.remove_from_cart(user, line_id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(stock_of(&store, product).await, 4);
    }

    #[tokio::test]
    async fn test_add_unknown_product() {
        let (store, user, _) = setup(4).await;
        let carts = CartService::new(&store);

        let err = carts
            .add_to_cart(user, ProductId::new(999), qty(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(_)));
    }
}
