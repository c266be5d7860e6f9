//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `NewAccount`: Fields needed to open an account
//! - `CreateAccountRequest`: Request body for creating accounts
//! - `AccountResponse`: Response body returned to clients
//! - `ListAccountsQuery`: Owner filter and paging for account listing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currencies accepted at the API edge.
pub const SUPPORTED_CURRENCIES: [&str; 3] = ["USD", "EUR", "CAD"];

/// Returns true if `currency` is one of [`SUPPORTED_CURRENCIES`].
pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `accounts` table. Each account:
/// - Belongs to one owner
/// - Holds its balance in a single currency for its whole lifetime
///
/// # Balance Storage
///
/// Balances are stored as `i64` minor units (cents) to avoid floating-point
/// precision issues. A transfer never drives a balance below zero; that rule
/// is enforced by the transfer engine, not by the table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct Account {
    /// Unique identifier for this account
    pub id: i64,

    /// Owner reference (username of the account holder)
    pub owner: String,

    /// Current balance in minor currency units
    pub balance: i64,

    /// Currency code (3 letters, e.g. "USD")
    pub currency: String,

    /// Timestamp when account was created
    pub created_at: DateTime<Utc>,
}

/// Fields for a fresh account row.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner: String,
    pub currency: String,
    pub balance: i64,
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "owner": "alice",
///   "currency": "USD",
///   "balance": 10000
/// }
/// ```
///
/// # Validation
///
/// - `owner`: Required, non-empty
/// - `currency`: Required, one of USD, EUR, CAD
/// - `balance`: Optional, defaults to 0, must not be negative
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub owner: String,

    pub currency: String,

    /// Opening balance in minor units (defaults to 0 if not provided)
    #[serde(default)]
    pub balance: i64,
}

impl CreateAccountRequest {
    /// Check the request and turn it into a [`NewAccount`].
    pub fn validate(self) -> Result<NewAccount, String> {
        if self.owner.trim().is_empty() {
            return Err("owner must not be empty".to_string());
        }
        if !is_supported_currency(&self.currency) {
            return Err(format!("unsupported currency: {}", self.currency));
        }
        if self.balance < 0 {
            return Err("balance must not be negative".to_string());
        }

        Ok(NewAccount {
            owner: self.owner,
            currency: self.currency,
            balance: self.balance,
        })
    }
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "owner": "alice",
///   "balance": 100000,
///   "currency": "USD",
///   "created_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: account.created_at,
        }
    }
}

/// Post-transfer view of an account: id plus the balance it was left with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: i64,
    pub balance: i64,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance,
        }
    }
}

/// Query parameters for `GET /accounts`.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    pub owner: String,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}
