//! Liveness and storage reachability.

use crate::{app::AppState, error::AppError};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,

    /// `"connected"` once [`Store::ping`](crate::store::Store::ping) succeeded.
    pub storage: String,

    pub timestamp: DateTime<Utc>,
}

/// Ping whichever store backs the service.
///
/// For PostgreSQL this is one `SELECT 1` through the pool; the in-memory
/// store always answers. A failed ping surfaces as a storage error (500)
/// with the usual error body.
///
/// ```json
/// {
///   "status": "healthy",
///   "storage": "connected",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.ping().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        storage: "connected".to_string(),
        timestamp: Utc::now(),
    }))
}
