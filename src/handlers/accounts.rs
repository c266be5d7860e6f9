//! Account HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /accounts - Open a new account
//! - GET /accounts - List accounts of an owner
//! - GET /accounts/{id} - Get account by ID
//! - GET /accounts/{id}/entries - Ledger entries of an account

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        account::{AccountResponse, CreateAccountRequest, ListAccountsQuery},
        transfer::{Entry, PageQuery, page_bounds},
    },
};

/// Open a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",
///   "balance": 10000
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created account
/// - **Error (400)**: Empty owner, unsupported currency or negative balance
/// - **Error (500)**: Storage error
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_account = request.validate().map_err(AppError::InvalidRequest)?;

    let account = state.store.create_account(new_account).await?;
    tracing::info!(account_id = account.id, currency = %account.currency, "account created");

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Get a specific account by ID.
///
/// # Response
///
/// - **Success (200 OK)**: Returns account details
/// - **Error (404)**: Account not found
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .store
        .get_account(account_id)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))?;

    Ok(Json(account.into()))
}

/// List accounts of one owner, ordered by id.
///
/// # Query Parameters
///
/// - `owner`: required, non-empty
/// - `limit`: 1 to 100, defaults to 10
/// - `offset`: defaults to 0
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    if query.owner.trim().is_empty() {
        return Err(AppError::InvalidRequest("owner must not be empty".to_string()));
    }
    let (limit, offset) =
        page_bounds(query.limit, query.offset).map_err(AppError::InvalidRequest)?;

    let accounts = state.store.list_accounts(&query.owner, limit, offset).await?;

    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// List ledger entries of an account, oldest first.
///
/// # Query Parameters
///
/// - `limit`: 1 to 100, defaults to 10
/// - `offset`: defaults to 0
pub async fn list_entries(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let (limit, offset) = page_bounds(page.limit, page.offset).map_err(AppError::InvalidRequest)?;

    if state.store.get_account(account_id).await?.is_none() {
        return Err(AppError::AccountNotFound(account_id));
    }

    let entries = state.store.list_entries(account_id, limit, offset).await?;

    Ok(Json(entries))
}
