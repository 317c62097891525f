//! Parallel reservations against scarce stock.

#![allow(clippy::unwrap_used)]

use canteen_integration_tests::{TestCanteen, qty};
use canteen_storefront::services::{CartError, CartService};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_goes_to_exactly_one_buyer() {
    let canteen = TestCanteen::new();
    let first = canteen.register("first@canteen.test").await;
    let second = canteen.register("second@canteen.test").await;
    let cake = canteen.product("Medovik", 1).await;

    let handles: Vec<_> = [first.id, second.id]
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
async fn test_many_buyers_never_oversell() {
    let canteen = TestCanteen::new();
    let mut users = Vec::new();
    for n in 0..8 {
        users.push(canteen.register(&format!("buyer{n}@canteen.test")).await.id);
    }
    let dumplings = canteen.product("Khinkali", 10).await;

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

    // 10 units, 3 per buyer.
    assert_eq!(succeeded, 3);
    assert_eq!(canteen.stock(dumplings).await, 1);
    assert_eq!(canteen.reserved(dumplings).await, 9);
}
