//! Scenario and concurrency tests for Canteen.
//!
//! Most tests run the storefront services against the in-memory store, so
//! they need no database:
//!
//! ```bash
//! cargo test -p canteen-integration-tests
//! ```
//!
//! The `postgres_*` tests are ignored by default. They exercise the row
//! locks and transactions of [`PgStore`] and need a database in
//! `DATABASE_URL`:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/canteen_test \
//!     cargo test -p canteen-integration-tests -- --ignored
//! ```
//!
//! # Test Files
//!
//! - `cart_scenarios` - Reserve/release scenarios and stock conservation
//! - `cart_concurrency` - Parallel reservations against scarce stock
//! - `access` - Registration, roles and admin stock changes
//! - `postgres_cart` - Races and rollbacks against `PostgreSQL`

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use canteen_core::{Price, ProductId, Quantity, Stock, UserId};
use canteen_storefront::models::{NewProduct, User};
use canteen_storefront::services::{AuthService, Registration};
use canteen_storefront::db::{MIGRATOR, create_pool};
use canteen_storefront::store::{MemoryStore, PgStore, Store, UnitOfWork};
use secrecy::SecretString;
use uuid::Uuid;

/// Password used for every test account.
pub const PASSWORD: &str = "correct horse battery";

/// A store with helpers for arranging test data.
#[derive(Clone, Default)]
pub struct TestCanteen<S = MemoryStore> {
    pub store: S,
}

impl TestCanteen {
    /// Empty in-memory canteen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }
}

impl TestCanteen<PgStore> {
    /// Canteen on the database in `DATABASE_URL`, migrated to the latest
    /// schema. The database is shared between tests, so arrange data with
    /// [`unique_email`] and [`unique_name`].
    pub async fn postgres() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = create_pool(&SecretString::from(url))
            .await
            .expect("Failed to connect to database");
        MIGRATOR.run(&pool).await.expect("Failed to run migrations");
        Self {
            store: PgStore::new(pool),
        }
    }
}

impl<S: Store> TestCanteen<S> {

    /// Register a customer with `email`.
    pub async fn register(&self, email: &str) -> User {
        AuthService::new(&self.store)
            .register(&registration(email))
            .await
            .unwrap()
    }

    /// Add a product with `stock` units at 2.50 each.
    pub async fn product(&self, name: &str, stock: i32) -> ProductId {
        let product = NewProduct::new(
            name,
            Price::from_cents(250).unwrap(),
            Stock::new(stock).unwrap(),
        )
        .unwrap();

        let mut uow = self.store.begin().await.unwrap();
        let created = uow.insert_product(&product).await.unwrap();
        uow.commit().await.unwrap();
        created.id
    }

    /// Units on the shelf.
    pub async fn stock(&self, id: ProductId) -> i32 {
        let mut uow = self.store.begin().await.unwrap();
        uow.product(id).await.unwrap().unwrap().stock.get()
    }

    /// Units of `id` held in all carts.
    pub async fn reserved(&self, id: ProductId) -> i64 {
        let mut uow = self.store.begin().await.unwrap();
        uow.reserved_quantity(id).await.unwrap()
    }

    /// Quantity of `product` in `user`'s cart, if any.
    pub async fn line_quantity(&self, user: UserId, product: ProductId) -> Option<i32> {
        let mut uow = self.store.begin().await.unwrap();
        uow.lock_cart_line_for_product(user, product)
            .await
            .unwrap()
            .map(|line| line.quantity.get())
    }
}

/// An email no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@canteen.test", Uuid::new_v4().simple())
}

/// A product name no other test run has used.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

/// Registration input with valid profile fields.
#[must_use]
pub fn registration(email: &str) -> Registration {
    Registration {
        email: email.to_owned(),
        password: PASSWORD.to_owned(),
        first_name: "Test".to_owned(),
        last_name: "Diner".to_owned(),
        phone: "+1 555 0100".to_owned(),
        gender: "unspecified".to_owned(),
    }
}

/// Shorthand for a positive quantity.
#[must_use]
pub fn qty(n: i32) -> Quantity {
    Quantity::new(n).unwrap()
}
