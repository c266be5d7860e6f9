//! Transfer and ledger entry models.
//!
//! This module defines:
//! - `Transfer`: one completed movement of funds between two accounts
//! - `Entry`: a per-account ledger line (signed delta)
//! - `TransferParams` / `TransferResult`: engine input and output
//! - `TransferRequest`: Request body for the transfer endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountSnapshot, is_supported_currency};

/// Represents a transfer record from the database.
///
/// # Database Table
///
/// Maps to the `transfers` table. Rows are append-only: created once by a
/// successful transfer and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,

    /// Account the funds left
    pub from_account_id: i64,

    /// Account the funds arrived at
    pub to_account_id: i64,

    /// Always positive (enforced by CHECK constraint)
    pub amount: i64,

    pub created_at: DateTime<Utc>,
}

/// Represents a ledger entry from the database.
///
/// Every transfer writes exactly two entries, `-amount` on the source and
/// `+amount` on the destination, so they sum to zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,

    pub account_id: i64,

    /// Negative for a debit, positive for a credit
    pub amount: i64,

    pub created_at: DateTime<Utc>,
}

/// Input of [`execute_transfer`](crate::services::transfer_service::execute_transfer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Everything a successful transfer produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: AccountSnapshot,
    pub to_account: AccountSnapshot,
}

/// Request to transfer money between accounts.
///
/// # JSON Example
///
/// ```json
/// {
///   "from_account_id": 1,
///   "to_account_id": 2,
///   "amount": 2500,
///   "currency": "USD"
/// }
/// ```
///
/// Both accounts must hold `currency`; the handler checks that before the
/// engine runs.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub currency: String,
}

impl TransferRequest {
    /// Shape checks that need no storage access.
    pub fn validate(&self) -> Result<TransferParams, String> {
        if self.from_account_id < 1 || self.to_account_id < 1 {
            return Err("account ids must be positive".to_string());
        }
        if self.amount <= 0 {
            return Err("amount must be greater than zero".to_string());
        }
        if !is_supported_currency(&self.currency) {
            return Err(format!("unsupported currency: {}", self.currency));
        }

        Ok(TransferParams {
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            amount: self.amount,
        })
    }
}

/// Pagination and filter parameters for `GET /transfers`.
#[derive(Debug, Deserialize)]
pub struct ListTransfersQuery {
    pub from_account_id: i64,
    pub to_account_id: i64,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Pagination parameters for `GET /accounts/{id}/entries`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Default page size when `limit` is absent.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolve optional paging values into `(limit, offset)`.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), String> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = offset.unwrap_or(0);

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(format!("limit must be between 1 and {MAX_PAGE_SIZE}"));
    }
    if offset < 0 {
        return Err("offset must not be negative".to_string());
    }

    Ok((limit, offset))
}
