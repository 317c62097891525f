//! In-process backend.
//!
//! A unit of work holds the store's async mutex for its whole lifetime, so
//! units of work run one at a time. Writes go to a private copy of the state
//! that replaces the shared one on commit; dropping the unit of work throws
//! the copy away.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use canteen_core::{CartLineId, CartLineView, Email, ProductId, Quantity, Role, Stock, UserId};

use super::{Store, UnitOfWork};
use crate::db::RepositoryError;
use crate::models::{CartLine, NewProduct, NewUser, Product, Profile, User};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: BTreeMap<UserId, StoredUser>,
    products: BTreeMap<ProductId, Product>,
    cart_lines: BTreeMap<CartLineId, CartLine>,
    last_user_id: i32,
    last_product_id: i32,
    last_cart_line_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

/// Store that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn begin(&self) -> Result<MemoryUnitOfWork, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryUnitOfWork { guard, staged })
    }
}

/// Exclusive access to a [`MemoryStore`] with staged writes.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryUnitOfWork {
    fn user_with_email(&self, email: &Email) -> Option<&StoredUser> {
        self.staged
            .users
            .values()
            .find(|stored| &stored.user.email == email)
    }

    fn line_owned_by(&self, user_id: UserId, line_id: CartLineId) -> Option<CartLine> {
        self.staged
            .cart_lines
            .get(&line_id)
            .filter(|line| line.user_id == user_id)
            .cloned()
    }
}

impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        if self.user_with_email(&user.email).is_some() {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let id = UserId::new(next_id(&mut self.staged.last_user_id));
        let created = User {
            id,
            email: user.email.clone(),
            profile: user.profile.clone(),
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };
        self.staged.users.insert(
            id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn user_by_id(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.staged.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.user_with_email(email).map(|stored| stored.user.clone()))
    }

    async fn user_credentials(
        &mut self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .user_with_email(email)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn update_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        let stored = self
            .staged
            .users
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.profile = profile.clone();
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn set_role(&mut self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        let stored = self
            .staged
            .users
            .values_mut()
            .find(|stored| &stored.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        stored.user.role = role;
        stored.user.updated_at = Utc::now();
        Ok(stored.user.clone())
    }

    async fn list_users(&mut self) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .staged
            .users
            .values()
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        let id = ProductId::new(next_id(&mut self.staged.last_product_id));
        let created = Product {
            id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        self.staged.products.insert(id, created.clone());
        Ok(created)
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        // The whole store is already held exclusively.
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self.staged.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn set_stock(&mut self, id: ProductId, stock: Stock) -> Result<Product, RepositoryError> {
        let product = self
            .staged
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&mut self, id: ProductId) -> Result<(), RepositoryError> {
        self.staged
            .products
            .remove(&id)
            .ok_or(RepositoryError::NotFound)?;
        self.staged
            .cart_lines
            .retain(|_, line| line.product_id != id);
        Ok(())
    }

    async fn reserved_quantity(&mut self, id: ProductId) -> Result<i64, RepositoryError> {
        Ok(self
            .staged
            .cart_lines
            .values()
            .filter(|line| line.product_id == id)
            .map(|line| i64::from(line.quantity.get()))
            .sum())
    }

    async fn cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self.line_owned_by(user_id, line_id))
    }

    async fn lock_cart_line(
        &mut self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self.line_owned_by(user_id, line_id))
    }

    async fn lock_cart_line_for_product(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        Ok(self
            .staged
            .cart_lines
            .values()
            .find(|line| line.user_id == user_id && line.product_id == product_id)
            .cloned())
    }

    async fn insert_cart_line(
        &mut self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        if !self.staged.users.contains_key(&user_id)
            || !self.staged.products.contains_key(&product_id)
        {
            return Err(RepositoryError::NotFound);
        }
        if self
            .staged
            .cart_lines
            .values()
            .any(|line| line.user_id == user_id && line.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(
                "cart line already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let id = CartLineId::new(next_id(&mut self.staged.last_cart_line_id));
        let line = CartLine {
            id,
            user_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        self.staged.cart_lines.insert(id, line.clone());
        Ok(line)
    }

    async fn set_cart_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: Quantity,
    ) -> Result<CartLine, RepositoryError> {
        let line = self
            .staged
            .cart_lines
            .get_mut(&line_id)
            .ok_or(RepositoryError::NotFound)?;
        line.quantity = quantity;
        line.updated_at = Utc::now();
        Ok(line.clone())
    }

    async fn delete_cart_line(&mut self, line_id: CartLineId) -> Result<(), RepositoryError> {
        self.staged
            .cart_lines
            .remove(&line_id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn cart_view(&mut self, user_id: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
        self.staged
            .cart_lines
            .values()
            .filter(|line| line.user_id == user_id)
            .map(|line| {
                let product = self.staged.products.get(&line.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(CartLineView {
                    line_id: line.id,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    unit_price: product.price,
                    quantity: line.quantity,
                })
            })
            .collect()
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        let Self { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use canteen_core::Price;

    use super::*;

    fn soup() -> NewProduct {
        NewProduct::new("Soup", Price::from_cents(450).unwrap(), Stock::new(3).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        uow.insert_product(&soup()).await.unwrap();
        drop(uow);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let store = MemoryStore::new();

        let mut uow = store.begin().await.unwrap();
        let product = uow.insert_product(&soup()).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.product(product.id).await.unwrap(), Some(product));
    }

    #[tokio::test]
    async fn test_delete_product_cascades_to_lines() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();

        let user = uow
            .insert_user(&NewUser {
                email: Email::parse("a@canteen.test").unwrap(),
                password_hash: "hash".to_owned(),
                profile: Profile::new("A", "B", "1", "x").unwrap(),
            })
            .await
            .unwrap();
        let product = uow.insert_product(&soup()).await.unwrap();
        uow.insert_cart_line(user.id, product.id, Quantity::ONE)
            .await
            .unwrap();

        uow.delete_product(product.id).await.unwrap();
        assert!(uow.cart_view(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_line_needs_existing_owner_and_product() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let product = uow.insert_product(&soup()).await.unwrap();

        let result = uow
            .insert_cart_line(UserId::new(99), product.id, Quantity::ONE)
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
