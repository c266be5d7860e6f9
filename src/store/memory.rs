//! Process-local store.
//!
//! Committed state (accounts, transfers, entries) lives behind one `RwLock`
//! so a commit becomes visible in a single step. Row locks are separate
//! per-account async mutexes: a unit takes the owned guard in
//! `get_account_for_update` and keeps it until it commits, rolls back or is
//! dropped. Writes are staged inside the unit and only published on commit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::{Store, StoreError, UnitOfWork};
use crate::models::{
    account::{Account, NewAccount},
    transfer::{Entry, Transfer},
};

/// A storage write that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPoint {
    /// Any balance update.
    UpdateBalance,
    /// Insert of the transfer record.
    CreateTransfer,
    /// The n-th entry insert of a unit, counted from 1.
    CreateEntry(usize),
    /// The commit itself.
    Commit,
}

#[derive(Debug, Default)]
struct Committed {
    accounts: HashMap<i64, Account>,
    /// Sorted by id.
    transfers: Vec<Transfer>,
    /// Sorted by id.
    entries: Vec<Entry>,
}

#[derive(Debug)]
struct Inner {
    committed: RwLock<Committed>,
    row_locks: DashMap<i64, Arc<Mutex<()>>>,
    faults: Mutex<Vec<FaultPoint>>,
    next_account_id: AtomicI64,
    next_transfer_id: AtomicI64,
    next_entry_id: AtomicI64,
}

impl Inner {
    /// Consume a pending fault matching `point`, if one was injected.
    async fn take_fault(&self, point: FaultPoint) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().await;
        match faults.iter().position(|fault| *fault == point) {
            Some(index) => {
                faults.remove(index);
                Err(StoreError::Fault(format!("{point:?}")))
            }
            None => Ok(()),
        }
    }
}

/// In-memory [`Store`]; clones share the same data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                committed: RwLock::new(Committed::default()),
                row_locks: DashMap::new(),
                faults: Mutex::new(Vec::new()),
                next_account_id: AtomicI64::new(1),
                next_transfer_id: AtomicI64::new(1),
                next_entry_id: AtomicI64::new(1),
            }),
        }
    }

    /// Make the next write matching `point` fail with [`StoreError::Fault`].
    ///
    /// Each injected fault fires once. Injecting the same point twice makes
    /// two writes fail.
    pub async fn inject_fault(&self, point: FaultPoint) {
        self.inner.faults.lock().await.push(point);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        Ok(Box::new(MemoryUnit {
            inner: Arc::clone(&self.inner),
            locks: HashMap::new(),
            balances: HashMap::new(),
            transfers: Vec::new(),
            entries: Vec::new(),
            entries_written: 0,
        }))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let account = Account {
            id: self.inner.next_account_id.fetch_add(1, Ordering::SeqCst),
            owner: account.owner,
            balance: account.balance,
            currency: account.currency,
            created_at: Utc::now(),
        };

        // Lock first: a row visible to readers must already be lockable.
        self.inner
            .row_locks
            .insert(account.id, Arc::new(Mutex::new(())));
        self.inner
            .committed
            .write()
            .await
            .accounts
            .insert(account.id, account.clone());

        Ok(account)
    }

    async fn get_account(&self, id: i64) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.committed.read().await.accounts.get(&id).cloned())
    }

    async fn list_accounts(
        &self,
        owner: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, StoreError> {
        let committed = self.inner.committed.read().await;
        let mut accounts: Vec<Account> = committed
            .accounts
            .values()
            .filter(|a| a.owner == owner)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.id);

        Ok(accounts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_transfer(&self, id: i64) -> Result<Option<Transfer>, StoreError> {
        let committed = self.inner.committed.read().await;
        Ok(committed
            .transfers
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|index| committed.transfers[index].clone()))
    }

    async fn list_entries(
        &self,
        account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Entry>, StoreError> {
        let committed = self.inner.committed.read().await;
        Ok(committed
            .entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_transfers(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transfer>, StoreError> {
        let committed = self.inner.committed.read().await;
        Ok(committed
            .transfers
            .iter()
            .filter(|t| t.from_account_id == from_account_id || t.to_account_id == to_account_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Atomic unit over a [`MemoryStore`].
pub struct MemoryUnit {
    inner: Arc<Inner>,
    /// Row locks held by this unit, released when it ends.
    locks: HashMap<i64, OwnedMutexGuard<()>>,
    /// Staged balances, keyed by account id.
    balances: HashMap<i64, i64>,
    transfers: Vec<Transfer>,
    entries: Vec<Entry>,
    entries_written: usize,
}

impl MemoryUnit {
    /// Committed row overlaid with this unit's staged balance.
    async fn view(&self, id: i64) -> Option<Account> {
        let mut account = self.inner.committed.read().await.accounts.get(&id).cloned()?;
        if let Some(balance) = self.balances.get(&id) {
            account.balance = *balance;
        }
        Some(account)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn get_account_for_update(&mut self, id: i64) -> Result<Option<Account>, StoreError> {
        if !self.locks.contains_key(&id) {
            // Clone the lock out so no DashMap shard guard is held across the await.
            let Some(row_lock) = self.inner.row_locks.get(&id).map(|r| Arc::clone(r.value()))
            else {
                return Ok(None);
            };
            let guard = row_lock.lock_owned().await;
            self.locks.insert(id, guard);
        }

        Ok(self.view(id).await)
    }

    async fn update_balance(&mut self, id: i64, balance: i64) -> Result<Account, StoreError> {
        if !self.locks.contains_key(&id) {
            return Err(StoreError::NotLocked(id));
        }
        self.inner.take_fault(FaultPoint::UpdateBalance).await?;

        self.balances.insert(id, balance);
        self.view(id).await.ok_or(StoreError::NotLocked(id))
    }

    async fn create_transfer(
        &mut self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> Result<Transfer, StoreError> {
        self.inner.take_fault(FaultPoint::CreateTransfer).await?;

        let transfer = Transfer {
            id: self.inner.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            from_account_id,
            to_account_id,
            amount,
            created_at: Utc::now(),
        };
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn create_entry(&mut self, account_id: i64, amount: i64) -> Result<Entry, StoreError> {
        self.entries_written += 1;
        self.inner
            .take_fault(FaultPoint::CreateEntry(self.entries_written))
            .await?;

        let entry = Entry {
            id: self.inner.next_entry_id.fetch_add(1, Ordering::SeqCst),
            account_id,
            amount,
            created_at: Utc::now(),
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.take_fault(FaultPoint::Commit).await?;

        let MemoryUnit {
            inner,
            locks,
            balances,
            transfers,
            entries,
            ..
        } = *self;

        let mut committed = inner.committed.write().await;
        for (id, balance) in balances {
            if let Some(account) = committed.accounts.get_mut(&id) {
                account.balance = balance;
            }
        }
        // Ids are drawn before commit, so units on disjoint rows can publish
        // out of id order. Keep the ledger sorted by id.
        committed.transfers.extend(transfers);
        committed.transfers.sort_by_key(|t| t.id);
        committed.entries.extend(entries);
        committed.entries.sort_by_key(|e| e.id);
        drop(committed);

        // Row locks go last so the next holder reads the published balances.
        drop(locks);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
