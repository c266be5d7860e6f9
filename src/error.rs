//! Error types and HTTP error response handling.
//!
//! This module defines:
//! - `TransferError`: what the transfer engine returns to its caller
//! - `AppError`: every failure a handler can produce, and how it is turned
//!   into an HTTP response with a status code and JSON body

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Failure of a single transfer.
///
/// Every variant means nothing was applied: no balance changed and no
/// transfer or entry record exists for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Amount is zero or negative.
    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(i64),

    /// Source and destination are the same account.
    #[error("cannot transfer from account {0} to itself")]
    SameAccount(i64),

    /// One of the accounts did not resolve when its row was locked.
    #[error("account {0} not found")]
    AccountNotFound(i64),

    /// Debit would drive the source balance below zero.
    #[error("account {account_id} has balance {balance}, cannot debit {amount}")]
    InsufficientFunds {
        account_id: i64,
        balance: i64,
        amount: i64,
    },

    /// Credit would overflow the destination balance.
    #[error("crediting {amount} would overflow the balance of account {account_id}")]
    BalanceOverflow { account_id: i64, amount: i64 },

    /// The store failed inside the atomic unit; the unit was rolled back.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

/// Application-wide error type.
///
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Storage Errors**: Any failure from the account/ledger store
/// - **Resource Errors**: Requested resources not found
/// - **Business Logic Errors**: Operations that violate business rules
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Storage operation failed (connection error, query error, ...).
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Requested account does not exist.
    #[error("Account {0} not found")]
    AccountNotFound(i64),

    /// Requested transfer does not exist.
    #[error("Transfer {0} not found")]
    TransferNotFound(i64),

    /// Account currency differs from the one in the request.
    #[error("Account {account_id} currency mismatch: {actual} vs {expected}")]
    CurrencyMismatch {
        account_id: i64,
        actual: String,
        expected: String,
    },

    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The transfer engine rejected or failed the transfer.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// The transfer did not finish within the configured budget and was abandoned.
    #[error("Transfer timed out")]
    Timeout,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `AccountNotFound`, `TransferNotFound` → 404 Not Found
/// - `InsufficientFunds` → 422 Unprocessable Entity
/// - `InvalidRequest`, `CurrencyMismatch`, `InvalidAmount`, `SameAccount` → 400 Bad Request
/// - `Timeout` → 504 Gateway Timeout
/// - storage failures → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::AccountNotFound(_)
            | AppError::Transfer(TransferError::AccountNotFound(_)) => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::TransferNotFound(_) => {
                (StatusCode::NOT_FOUND, "transfer_not_found", self.to_string())
            }
            AppError::CurrencyMismatch { .. } => {
                (StatusCode::BAD_REQUEST, "currency_mismatch", self.to_string())
            }
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Transfer(TransferError::InvalidAmount(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_amount", self.to_string())
            }
            AppError::Transfer(TransferError::SameAccount(_)) => {
                (StatusCode::BAD_REQUEST, "same_account", self.to_string())
            }
            AppError::Transfer(TransferError::InsufficientFunds { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
            ),
            AppError::Transfer(TransferError::BalanceOverflow { .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "balance_overflow",
                self.to_string(),
            ),
            AppError::Timeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "transfer_timeout",
                self.to_string(),
            ),
            AppError::Storage(_) | AppError::Transfer(TransferError::Storage(_)) => {
                tracing::error!(error = %self, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
