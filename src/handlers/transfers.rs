//! Transfer HTTP handlers.
//!
//! This module implements transfer-related API endpoints:
//! - POST /transfers - Move money between accounts
//! - GET /transfers/{id} - Get transfer details
//! - GET /transfers - List transfers touching a pair of accounts

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    app::AppState,
    error::{AppError, TransferError},
    models::transfer::{
        ListTransfersQuery, Transfer, TransferRequest, TransferResult, page_bounds,
    },
    services::transfer_service,
};

/// Check that an account exists and holds `currency`.
async fn validate_account(state: &AppState, account_id: i64, currency: &str) -> Result<(), AppError> {
    let account = state
        .store
        .get_account(account_id)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))?;

    if account.currency != currency {
        return Err(AppError::CurrencyMismatch {
            account_id,
            actual: account.currency,
            expected: currency.to_string(),
        });
    }

    Ok(())
}

/// Transfer money between accounts.
///
/// # Request Body
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 30,
///   "currency": "USD"
/// }
/// ```
///
/// # Atomicity
///
/// Both balances, the transfer record and both entries are written in a
/// single atomic unit. If the transfer does not finish within the
/// configured timeout the unit is dropped, which rolls it back, and 504 is
/// returned.
///
/// # Validation
///
/// - Both accounts must exist and hold `currency`
/// - Source must have sufficient balance (checked under lock)
/// - Accounts must be different
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResult>, AppError> {
    let params = request.validate().map_err(AppError::InvalidRequest)?;

    validate_account(&state, params.from_account_id, &request.currency).await?;
    validate_account(&state, params.to_account_id, &request.currency).await?;

    let outcome = tokio::time::timeout(
        state.transfer_timeout,
        transfer_service::execute_transfer(state.store.as_ref(), params),
    )
    .await;

    match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                transfer_id = result.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                "transfer completed"
            );
            Ok(Json(result))
        }
        Ok(Err(err @ TransferError::Storage(_))) => Err(err.into()),
        Ok(Err(err)) => {
            tracing::warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                error = %err,
                "transfer rejected"
            );
            Err(err.into())
        }
        Err(_) => {
            tracing::warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                timeout_ms = state.transfer_timeout.as_millis() as u64,
                "transfer timed out and was rolled back"
            );
            Err(AppError::Timeout)
        }
    }
}

/// Get transfer by ID.
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(transfer_id): Path<i64>,
) -> Result<Json<Transfer>, AppError> {
    let transfer = state
        .store
        .get_transfer(transfer_id)
        .await?
        .ok_or(AppError::TransferNotFound(transfer_id))?;

    Ok(Json(transfer))
}

/// List transfers leaving `from_account_id` or arriving at `to_account_id`.
///
/// # Query Parameters
///
/// - `from_account_id`, `to_account_id`: required
/// - `limit`: 1 to 100, defaults to 10
/// - `offset`: defaults to 0
pub async fn list_transfers(
    State(state): State<AppState>,
    Query(query): Query<ListTransfersQuery>,
) -> Result<Json<Vec<Transfer>>, AppError> {
    let (limit, offset) =
        page_bounds(query.limit, query.offset).map_err(AppError::InvalidRequest)?;

    let transfers = state
        .store
        .list_transfers(query.from_account_id, query.to_account_id, limit, offset)
        .await?;

    Ok(Json(transfers))
}
