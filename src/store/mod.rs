//! Storage collaborators of the transfer engine.
//!
//! [`Store`] is the shared handle (account store + ledger store) that request
//! handlers hold. [`Store::begin`] opens a [`UnitOfWork`]: an atomic unit in
//! which the engine locks account rows, rewrites balances and appends ledger
//! records. A unit is committed explicitly; dropping it without a commit
//! rolls everything back, so a cancelled caller never leaves half a transfer
//! behind.
//!
//! Two backends implement the traits:
//! - [`postgres::PgStore`]: sqlx transactions and row locks
//! - [`memory::MemoryStore`]: per-account async mutexes, staged writes

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    account::{Account, NewAccount},
    transfer::{Entry, Transfer},
};

/// Failure inside the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Driver, connection or query failure from PostgreSQL.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Fault injected into the in-memory store.
    #[error("injected storage fault: {0}")]
    Fault(String),

    /// A row the unit expected to hold a lock on is not locked by it.
    #[error("account {0} is not locked by this unit")]
    NotLocked(i64),
}

/// Shared handle over accounts and the transfer ledger.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new atomic unit.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Insert a fresh account row.
    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// Non-locking read of an account.
    async fn get_account(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Accounts of one owner, ordered by id.
    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError>;

    async fn get_transfer(&self, id: i64) -> Result<Option<Transfer>, StoreError>;

    /// Entries of one account, ordered by id.
    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError>;

    /// Transfers leaving `from_account_id` or arriving at `to_account_id`, ordered by id.
    async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One atomic unit against the store.
///
/// Reads through [`get_account_for_update`](UnitOfWork::get_account_for_update)
/// hold an exclusive lock on the row until the unit ends. Nothing written
/// through a unit is visible to other units before [`commit`](UnitOfWork::commit).
#[async_trait]
pub trait UnitOfWork: Send {
    /// Lock the account row and return it as of lock acquisition.
    async fn get_account_for_update(&mut self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Overwrite the balance of an account locked by this unit.
    async fn update_balance(&mut self, id: i64, balance: i64) -> Result<Account, StoreError>;

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError>;

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError>;

    /// Make every write of this unit visible at once and release its locks.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write of this unit and release its locks.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
