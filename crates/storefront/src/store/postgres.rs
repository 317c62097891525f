//! `PostgreSQL` backend.
//!
//! A [`PgUnitOfWork`] is a database transaction. Row locks taken with
//! `SELECT ... FOR UPDATE` are released at commit or rollback, and dropping
//! the transaction without committing rolls it back.

use sqlx::{PgPool, Postgres, Transaction};

use canteen_core::{CartLineId, CartLineView, Email, ProductId, Quantity, Role, Stock, UserId};

use super::{Store, UnitOfWork};
use crate::db::{CartLineRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::{CartLine, NewProduct, NewUser, Product, Profile, User};

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

/// An open `PostgreSQL` transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    fn users(&mut self) -> UserRepository<'_> {
        UserRepository::new(&mut self.tx)
    }

    fn products(&mut self) -> ProductRepository<'_> {
        ProductRepository::new(&mut self.tx)
    }

    fn cart_lines(&mut self) -> CartLineRepository<'_> {
        CartLineRepository::new(&mut self.tx)
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        self.users().create(user).await
    }

    async fn user_by_id(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.users().get_by_id(id).await
    }

    async fn user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.users().get_by_email(email).await
    }

    async fn user_credentials(
        &mut self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        self.users().get_password_hash(email).await
    }

    async fn update_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        self.users().update_profile(id, profile).await
    }

    async fn set_role(&mut self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        self.users().set_role(email, role).await
    }

    async fn list_users(&mut self) -> Result<Vec<User>, RepositoryError> {
        self.users().list().await
    }

    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.products().create(product).await
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.products().get(id).await
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.products().lock(id).await
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        self.products().list().await
    }

    async fn set_stock(&mut self, id: ProductId, stock: Stock) -> Result<Product, RepositoryError> {
        self.products().set_stock(id, stock).await
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<(), RepositoryError> {
        self.products().delete(id).await
    }

    async fn reserved_quantity(&mut self, id: ProductId) -> Result<i64, RepositoryError> {
        self.products().reserved_quantity(id).await
    }

    async fn cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        self.cart_lines().get(user_id, line_id).await
    }

    async fn lock_cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        self.cart_lines().lock(user_id, line_id).await
    }

    async fn lock_cart_line_for_product(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        self.cart_lines().lock_for_product(user_id, product_id).await
    }

    async fn insert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        self.cart_lines()
            .create(user_id, product_id, quantity)
            .await
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        self.cart_lines().set_quantity(line_id, quantity).await
    }

    async fn delete_cart_line(&mut self, line_id: CartLineId) -> Result<(), RepositoryError> {
        self.cart_lines().delete(line_id).await
    }

    async fn cart_view(&mut self, user_id: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
        self.cart_lines().list_view(user_id).await
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
