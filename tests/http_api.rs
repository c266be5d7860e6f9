//! HTTP surface tests against the in-memory store.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use simple_bank::{
    app::{AppState, router},
    models::{account::AccountResponse, transfer::TransferResult},
    store::{Store, memory::MemoryStore},
};
use tower::ServiceExt;

fn app(store: &MemoryStore) -> Router {
    let store: Arc<dyn Store> = Arc::new(store.clone());
    router(AppState::new(store, Duration::from_secs(2)))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_account(store: &MemoryStore, owner: &str, currency: &str, balance: i64) -> AccountResponse {
    let (status, body) = send(
        app(store),
        Method::POST,
        "/accounts",
        Some(json!({ "owner": owner, "currency": currency, "balance": balance })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn transfer_moves_funds_and_returns_the_composite_result() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 100).await;
    let b = create_account(&store, "bob", "USD", 50).await;

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 30,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let result: TransferResult = serde_json::from_value(body).unwrap();
    assert_eq!(result.from_account.balance, 70);
    assert_eq!(result.to_account.balance, 80);
    assert_eq!(result.transfer.amount, 30);

    let (status, body) = send(app(&store), Method::GET, &format!("/accounts/{}", a.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 70);

    let (status, body) = send(
        app(&store),
        Method::GET,
        &format!("/transfers/{}", result.transfer.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_account_id"], a.id);
    assert_eq!(body["to_account_id"], b.id);

    let (status, body) = send(
        app(&store),
        Method::GET,
        &format!("/accounts/{}/entries", b.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["amount"], 30);

    let (status, body) = send(
        app(&store),
        Method::GET,
        &format!("/transfers?from_account_id={}&to_account_id={}", a.id, b.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn insufficient_funds_is_unprocessable() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 10).await;
    let b = create_account(&store, "bob", "USD", 0).await;

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 50,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "insufficient_funds");
    assert_eq!(store.get_account(a.id).await.unwrap().unwrap().balance, 10);
}

#[tokio::test]
async fn currency_mismatch_is_rejected_before_the_engine_runs() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 100).await;
    let b = create_account(&store, "bob", "EUR", 100).await;

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 10,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "currency_mismatch");
    assert!(store.list_transfers(a.id, b.id, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 100).await;

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": 404,
            "amount": 10,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "account_not_found");
}

#[tokio::test]
async fn same_account_transfer_is_a_bad_request() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 100).await;

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": a.id,
            "amount": 10,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "same_account");
}

#[tokio::test]
async fn malformed_transfer_body_is_a_bad_request() {
    let store = MemoryStore::new();

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": 1,
            "to_account_id": 2,
            "amount": 0,
            "currency": "USD"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn blocked_transfer_times_out_without_applying() {
    let store = MemoryStore::new();
    let a = create_account(&store, "alice", "USD", 100).await;
    let b = create_account(&store, "bob", "USD", 100).await;

    let mut blocker = store.begin().await.unwrap();
    blocker.get_account_for_update(b.id).await.unwrap();

    let state = AppState::new(Arc::new(store.clone()), Duration::from_millis(50));
    let (status, body) = send(
        router(state),
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a.id,
            "to_account_id": b.id,
            "amount": 10,
            "currency": "USD"
        })),
    )
    .await;
    blocker.rollback().await.unwrap();

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "transfer_timeout");
    assert_eq!(store.get_account(a.id).await.unwrap().unwrap().balance, 100);
    assert!(store.list_entries(a.id, 10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn account_validation_and_lookup() {
    let store = MemoryStore::new();

    let (status, _) = send(
        app(&store),
        Method::POST,
        "/accounts",
        Some(json!({ "owner": "alice", "currency": "JPY" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(&store), Method::GET, "/accounts/12", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "account_not_found");

    let (status, _) = send(app(&store), Method::GET, "/accounts/12/entries", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(app(&store), Method::GET, "/transfers/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "transfer_not_found");
}

#[tokio::test]
async fn lists_accounts_of_one_owner_page_by_page() {
    let store = MemoryStore::new();
    let first = create_account(&store, "alice", "USD", 10).await;
    create_account(&store, "bob", "USD", 20).await;
    let second = create_account(&store, "alice", "EUR", 30).await;

    let (status, body) = send(app(&store), Method::GET, "/accounts?owner=alice", None).await;
    assert_eq!(status, StatusCode::OK);
    let accounts: Vec<AccountResponse> = serde_json::from_value(body).unwrap();
    let ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(accounts.iter().all(|a| a.owner == "alice"));

    let (status, body) = send(
        app(&store),
        Method::GET,
        "/accounts?owner=alice&limit=1&offset=1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], second.id);

    let (status, body) = send(app(&store), Method::GET, "/accounts?owner=alice&limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");

    let (status, body) = send(app(&store), Method::GET, "/accounts?owner=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn health_reports_connected_storage() {
    let store = MemoryStore::new();

    let (status, body) = send(app(&store), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "connected");
}
