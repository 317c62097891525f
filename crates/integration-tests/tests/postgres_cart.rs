//! Cart races and rollbacks against `PostgreSQL`.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`. They
//! share it with other runs, so every user and product is freshly named.
//!
//! Run with: cargo test -p canteen-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use canteen_core::Stock;
use canteen_integration_tests::{TestCanteen, qty, unique_email, unique_name};
use canteen_storefront::services::{CartError, CartService};
use canteen_storefront::store::{PgStore, Store, UnitOfWork};

async fn buyers(canteen: &TestCanteen<PgStore>, n: usize) -> Vec<canteen_core::UserId> {
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        ids.push(canteen.register(&unique_email("buyer")).await.id);
    }
    ids
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires running database"]
async fn postgres_last_unit_goes_to_exactly_one_buyer() {
    let canteen = TestCanteen::postgres().await;
    let users = buyers(&canteen, 2).await;
    let cake = canteen.product(&unique_name("Medovik"), 1).await;

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let store = canteen.store.clone();
            tokio::spawn(async move {
                CartService::new(&store).add_to_cart(user, cake, qty(1)).await
            })
        })
        .collect();

    let mut succeeded = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(CartError::InsufficientStock { .. }) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((succeeded, refused), (1, 1));
    assert_eq!(canteen.stock(cake).await, 0);
    assert_eq!(canteen.reserved(cake).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires running database"]
async fn postgres_many_buyers_never_oversell() {
    let canteen = TestCanteen::postgres().await;
    let users = buyers(&canteen, 8).await;
    let dumplings = canteen.product(&unique_name("Khinkali"), 10).await;

    let handles: Vec<_> = users
        .into_iter()
        .map(|user| {
            let store = canteen.store.clone();
            tokio::spawn(async move {
                CartService::new(&store)
                    .add_to_cart(user, dumplings, qty(3))
                    .await
                    .is_ok()
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(canteen.stock(dumplings).await, 1);
    assert_eq!(canteen.reserved(dumplings).await, 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires running database"]
async fn postgres_adds_and_removes_conserve_units() {
    let canteen = TestCanteen::postgres().await;
    let holders = buyers(&canteen, 4).await;
    let newcomers = buyers(&canteen, 4).await;
    let soup = canteen.product(&unique_name("Solyanka"), 10).await;

    let mut lines = Vec::new();
    for &user in &holders {
        let cart = CartService::new(&canteen.store)
            .add_to_cart(user, soup, qty(2))
            .await
            .unwrap();
        lines.push((user, cart.line_for(soup).unwrap().line_id));
    }
    assert_eq!(canteen.stock(soup).await, 2);

    let mut handles = Vec::new();
    for (user, line) in lines {
        let store = canteen.store.clone();
        handles.push(tokio::spawn(async move {
            CartService::new(&store)
                .remove_from_cart(user, line)
                .await
                .map(|_| ())
        }));
    }
    for user in newcomers {
        let store = canteen.store.clone();
        handles.push(tokio::spawn(async move {
            CartService::new(&store)
                .add_to_cart(user, soup, qty(1))
                .await
                .map(|_| ())
        }));
    }
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) | Err(CartError::InsufficientStock { .. }) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let stock = i64::from(canteen.stock(soup).await);
    assert_eq!(stock + canteen.reserved(soup).await, 10);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn postgres_refused_add_changes_nothing() {
    let canteen = TestCanteen::postgres().await;
    let user = canteen.register(&unique_email("diner")).await;
    let pie = canteen.product(&unique_name("Pirozhki"), 2).await;

    let err = CartService::new(&canteen.store)
        .add_to_cart(user.id, pie, qty(5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CartError::InsufficientStock { requested, available }
            if requested == qty(5) && available.get() == 2
    ));
    assert_eq!(canteen.stock(pie).await, 2);
    assert_eq!(canteen.line_quantity(user.id, pie).await, None);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn postgres_merge_then_release_once() {
    let canteen = TestCanteen::postgres().await;
    let user = canteen.register(&unique_email("diner")).await;
    let tea = canteen.product(&unique_name("Chai"), 10).await;
    let carts = CartService::new(&canteen.store);

    carts.add_to_cart(user.id, tea, qty(4)).await.unwrap();
    let cart = carts.add_to_cart(user.id, tea, qty(3)).await.unwrap();
    assert_eq!(canteen.line_quantity(user.id, tea).await, Some(7));
    assert_eq!(canteen.stock(tea).await, 3);

    let line = cart.line_for(tea).unwrap().line_id;
    assert!(carts.remove_from_cart(user.id, line).await.unwrap().is_empty());
    assert!(matches!(
        carts.remove_from_cart(user.id, line).await,
        Err(CartError::LineNotFound(_))
    ));
    assert_eq!(canteen.stock(tea).await, 10);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn postgres_uncommitted_unit_of_work_rolls_back() {
    let canteen = TestCanteen::postgres().await;
    let bread = canteen.product(&unique_name("Lavash"), 6).await;

    {
        let mut uow = canteen.store.begin().await.unwrap();
        uow.set_stock(bread, Stock::ZERO).await.unwrap();
        assert_eq!(uow.product(bread).await.unwrap().unwrap().stock, Stock::ZERO);
    }

    assert_eq!(canteen.stock(bread).await, 6);
}
