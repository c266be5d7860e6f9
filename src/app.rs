//! Shared handler state and the HTTP router.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, store::Store};

/// State shared with every handler via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// Account and ledger store
    pub store: Arc<dyn Store>,

    /// Upper bound for one transfer, lock waits included
    pub transfer_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, transfer_timeout: Duration) -> Self {
        Self {
            store,
            transfer_timeout,
        }
    }
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // Account routes
        .route(
            "/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route("/accounts/{id}", get(handlers::accounts::get_account))
        .route(
            "/accounts/{id}/entries",
            get(handlers::accounts::list_entries),
        )
        // Transfer routes
        .route(
            "/transfers",
            post(handlers::transfers::create_transfer).get(handlers::transfers::list_transfers),
        )
        .route("/transfers/{id}", get(handlers::transfers::get_transfer))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
