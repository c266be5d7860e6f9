//! Concurrency properties of the transfer engine, run against the in-memory store.

use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use simple_bank::{
    error::TransferError,
    models::{
        account::NewAccount,
        transfer::{TransferParams, TransferResult},
    },
    services::transfer_service::execute_transfer,
    store::{Store, memory::MemoryStore},
};
use tokio::task::JoinHandle;

async fn open(store: &MemoryStore, balance: i64) -> i64 {
    store
        .create_account(NewAccount {
            owner: "owner".to_string(),
            currency: "USD".to_string(),
            balance,
        })
        .await
        .unwrap()
        .id
}

async fn balance(store: &MemoryStore, id: i64) -> i64 {
    store.get_account(id).await.unwrap().unwrap().balance
}

fn params(from: i64, to: i64, amount: i64) -> TransferParams {
    TransferParams {
        from_account_id: from,
        to_account_id: to,
        amount,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ten_concurrent_transfers_apply_exactly_once_each() {
    let store = MemoryStore::new();
    let a = open(&store, 100).await;
    let b = open(&store, 100).await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { execute_transfer(&store, params(a, b, 5)).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.from_entry.amount, -5);
        assert_eq!(result.to_entry.amount, 5);
    }

    assert_eq!(balance(&store, a).await, 50);
    assert_eq!(balance(&store, b).await, 150);
    assert_eq!(store.list_transfers(a, b, 100, 0).await.unwrap().len(), 10);
    assert_eq!(store.list_entries(a, 100, 0).await.unwrap().len(), 10);
    assert_eq!(store.list_entries(b, 100, 0).await.unwrap().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_lost_updates_under_contention() {
    let store = MemoryStore::new();
    let initial = 10_000;
    let a = open(&store, initial).await;
    let b = open(&store, initial).await;
    let (n, amount) = (200, 7);

    let handles: Vec<_> = (0..n)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { execute_transfer(&store, params(a, b, amount)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(balance(&store, a).await, initial - n * amount);
    assert_eq!(balance(&store, b).await, initial + n * amount);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_direction_transfers_do_not_deadlock() {
    let store = MemoryStore::new();
    let a = open(&store, 1_000).await;
    let b = open(&store, 1_000).await;

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let store = store.clone();
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            tokio::spawn(async move { execute_transfer(&store, params(from, to, 10)).await })
        })
        .collect();

    tokio::time::timeout(Duration::from_secs(10), join_all(handles))
        .await
        .expect("transfers hung");

    // 50 each way cancel out.
    assert_eq!(balance(&store, a).await, 1_000);
    assert_eq!(balance(&store, b).await, 1_000);
}

async fn join_all(handles: Vec<JoinHandle<Result<TransferResult, TransferError>>>) {
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn random_interleavings_never_overdraw_and_conserve_money() {
    let store = MemoryStore::new();
    let mut accounts = Vec::new();
    for _ in 0..5 {
        accounts.push(open(&store, 100).await);
    }
    let total: i64 = 500;

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut handles = Vec::new();
    for _ in 0..300 {
        let from = accounts[rng.random_range(0..accounts.len())];
        let mut to = accounts[rng.random_range(0..accounts.len())];
        if to == from {
            to = accounts[(accounts.iter().position(|id| *id == from).unwrap() + 1) % accounts.len()];
        }
        let amount = rng.random_range(1..=60);

        let store = store.clone();
        handles.push(tokio::spawn(async move {
            execute_transfer(&store, params(from, to, amount)).await
        }));
    }

    let observer = {
        let store = store.clone();
        let accounts = accounts.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                for id in &accounts {
                    let account = store.get_account(*id).await.unwrap().unwrap();
                    assert!(account.balance >= 0, "account {id} went negative");
                }
                tokio::task::yield_now().await;
            }
        })
    };

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                assert!(result.from_account.balance >= 0);
                succeeded += 1;
            }
            Err(TransferError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    observer.await.unwrap();

    let mut sum = 0;
    for id in &accounts {
        let current = balance(&store, *id).await;
        assert!(current >= 0);
        sum += current;
    }
    assert_eq!(sum, total);

    let mut entries = 0;
    for id in &accounts {
        entries += store.list_entries(*id, 1_000, 0).await.unwrap().len();
    }
    assert_eq!(entries, succeeded * 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_transfer_rolls_back_and_releases_locks() {
    let store = MemoryStore::new();
    let a = open(&store, 100).await;
    let b = open(&store, 100).await;

    // Another unit holds b, so the transfer locks a and then waits on b.
    let mut blocker = store.begin().await.unwrap();
    blocker.get_account_for_update(b).await.unwrap();

    let shared: Arc<dyn Store> = Arc::new(store.clone());
    let attempt = tokio::time::timeout(
        Duration::from_millis(50),
        execute_transfer(shared.as_ref(), params(a, b, 30)),
    )
    .await;
    assert!(attempt.is_err());

    blocker.rollback().await.unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        execute_transfer(&store, params(a, b, 30)),
    )
    .await
    .expect("lock on the source account was leaked")
    .unwrap();

    assert_eq!(result.from_account.balance, 70);
    assert_eq!(balance(&store, b).await, 130);
    assert_eq!(store.list_transfers(a, b, 10, 0).await.unwrap().len(), 1);
}
