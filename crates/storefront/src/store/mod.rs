//! Transactional storage for users, products and cart lines.
//!
//! Every service operation runs inside one [`UnitOfWork`] obtained from
//! [`Store::begin`]. Writes become visible to other units of work only after
//! [`UnitOfWork::commit`]; dropping an uncommitted unit of work discards them.
//!
//! Two backends implement the traits:
//!
//! - [`PgStore`] - `PostgreSQL` transactions with row locks
//! - [`MemoryStore`] - an in-process store for tests and local tooling
//!
//! # Locking
//!
//! `lock_*` methods hold the row until the unit of work ends. Callers that
//! need both a product and one of its cart lines lock the product first.

mod memory;
mod postgres;

use std::future::Future;

use canteen_core::{CartLineId, CartLineView, Email, ProductId, Quantity, Role, Stock, UserId};

pub use memory::MemoryStore;
pub use postgres::{PgStore, PgUnitOfWork};

use crate::db::RepositoryError;
use crate::models::{CartLine, NewProduct, NewUser, Product, Profile, User};

/// A source of units of work.
pub trait Store: Clone + Send + Sync + 'static {
    /// The unit of work type handed out by [`Store::begin`].
    type UnitOfWork: UnitOfWork;

    /// Start a unit of work.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a connection or transaction
    /// cannot be obtained.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork, RepositoryError>> + Send;
}

/// One atomic batch of reads and writes.
///
/// Errors follow [`RepositoryError`]: `NotFound` for missing rows,
/// `Conflict` for uniqueness or check violations.
pub trait UnitOfWork: Send {
    // Users

    /// Insert a user with the default role. Duplicate email is a `Conflict`.
    fn insert_user(
        &mut self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up a user by ID.
    fn user_by_id(
        &mut self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user by email.
    fn user_by_email(
        &mut self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user and their password hash by email.
    fn user_credentials(
        &mut self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    /// Replace a user's profile fields.
    fn update_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Set the role of the user with `email`.
    fn set_role(
        &mut self,
        email: &Email,
        role: Role,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// All users, oldest first.
    fn list_users(&mut self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    // Products

    /// Insert a product.
    fn insert_product(
        &mut self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Read a product without locking it.
    fn product(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Read a product and hold its lock until the unit of work ends.
    fn lock_product(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// All products by name.
    fn list_products(
        &mut self,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// Overwrite a product's stock.
    fn set_stock(
        &mut self,
        id: ProductId,
        stock: Stock,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Delete a product and its cart lines.
    fn delete_product(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Units of a product currently held in carts.
    fn reserved_quantity(
        &mut self,
        id: ProductId,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    // Cart lines

    /// Read a user's line without locking it.
    fn cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// Lock a user's line by ID.
    fn lock_cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// Lock the user's line for a product, if any.
    fn lock_cart_line_for_product(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Option<CartLine>, RepositoryError>> + Send;

    /// Insert a line. A second line for the same (user, product) is a `Conflict`.
    fn insert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    /// Set a line's quantity.
    fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartLine, RepositoryError>> + Send;

    /// Delete a line.
    fn delete_cart_line(
        &mut self,
        line_id: CartLineId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// A user's lines joined with their products, in insertion order.
    fn cart_view(
        &mut self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<CartLineView>, RepositoryError>> + Send;

    /// Publish every write made through this unit of work.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
