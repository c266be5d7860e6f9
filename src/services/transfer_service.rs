//! Transfer service - moves funds between two accounts.
//!
//! This service handles:
//! - Deadlock-free row locking (ascending account id order)
//! - Balance validation against the locked rows
//! - Atomic balance updates plus the transfer and entry records
//!
//! # Atomicity Guarantees
//!
//! Every write happens inside one [`UnitOfWork`]. Any error after the unit
//! is opened rolls it back before it is returned, and a caller that drops
//! the future mid-flight drops the unit, which rolls back as well. Errors
//! are never retried here.
//!
//! # Concurrency
//!
//! The function is stateless and re-entrant; call it from as many tasks as
//! needed against one shared store. Two transfers touching the same account
//! are serialized by that account's row lock. Locks are always taken lower
//! id first, so `A -> B` racing `B -> A` cannot wait on each other in a
//! cycle.

use crate::{
    error::TransferError,
    models::{
        account::{Account, AccountSnapshot},
        transfer::{TransferParams, TransferResult},
    },
    store::{Store, UnitOfWork},
};

/// Rows of a transfer's two accounts, as read under lock.
#[derive(Debug)]
struct LockedPair {
    from: Account,
    to: Account,
}

/// Lock both accounts inside `unit`, lower id first, whatever their roles.
///
/// The locks stay held until the unit commits, rolls back or is dropped.
async fn lock_accounts(
    unit: &mut dyn UnitOfWork,
    from_account_id: i64,
    to_account_id: i64,
) -> Result<LockedPair, TransferError> {
    let (first_id, second_id) = if from_account_id < to_account_id {
        (from_account_id, to_account_id)
    } else {
        (to_account_id, from_account_id)
    };

    let first = unit
        .get_account_for_update(first_id)
        .await?
        .ok_or(TransferError::AccountNotFound(first_id))?;
    let second = unit
        .get_account_for_update(second_id)
        .await?
        .ok_or(TransferError::AccountNotFound(second_id))?;

    Ok(if first.id == from_account_id {
        LockedPair {
            from: first,
            to: second,
        }
    } else {
        LockedPair {
            from: second,
            to: first,
        }
    })
}

/// Execute a transfer (move `amount` from one account to another).
///
/// # Process
///
/// 1. Reject non-positive amounts and self-transfers (no storage access)
/// 2. Begin an atomic unit
/// 3. Lock both accounts in ascending id order, reading current balances
/// 4. Check the source balance covers the amount
/// 5. Debit the source, credit the destination
/// 6. Record the transfer and one entry per account
/// 7. Commit
///
/// # Errors
///
/// - `InvalidAmount`: `amount <= 0`
/// - `SameAccount`: `from_account_id == to_account_id`
/// - `AccountNotFound`: an account id did not resolve under lock
/// - `InsufficientFunds`: source balance (read under lock) is below `amount`
/// - `BalanceOverflow`: destination balance would exceed `i64::MAX`
/// - `Storage`: the store failed; nothing was applied
///
/// Each successful call creates exactly one transfer and two entries.
/// Deduplicating retried requests is up to the caller.
pub async fn execute_transfer(
    store: &dyn Store,
    params: TransferParams,
) -> Result<TransferResult, TransferError> {
    let TransferParams {
        from_account_id,
        to_account_id,
        amount,
    } = params;

    if amount <= 0 {
        return Err(TransferError::InvalidAmount(amount));
    }
    if from_account_id == to_account_id {
        return Err(TransferError::SameAccount(from_account_id));
    }

    let mut unit = store.begin().await?;

    let outcome = apply_transfer(unit.as_mut(), from_account_id, to_account_id, amount).await;
    match outcome {
        Ok(result) => {
            unit.commit().await?;
            Ok(result)
        }
        Err(err) => {
            // Surface the original failure; a failed rollback still discards
            // the unit when it is dropped.
            let _ = unit.rollback().await;
            Err(err)
        }
    }
}

/// Steps 3 to 6, all against the already opened unit.
async fn apply_transfer(
    unit: &mut dyn UnitOfWork,
    from_account_id: i64,
    to_account_id: i64,
    amount: i64,
) -> Result<TransferResult, TransferError> {
    let LockedPair { from, to } = lock_accounts(unit, from_account_id, to_account_id).await?;

    let new_from_balance = from
        .balance
        .checked_sub(amount)
        .filter(|balance| *balance >= 0)
        .ok_or(TransferError::InsufficientFunds {
            account_id: from.id,
            balance: from.balance,
            amount,
        })?;
    let new_to_balance =
        to.balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow {
                account_id: to.id,
                amount,
            })?;

    let from_account = unit.update_balance(from.id, new_from_balance).await?;
    let to_account = unit.update_balance(to.id, new_to_balance).await?;

    let transfer = unit.create_transfer(from.id, to.id, amount).await?;
    let from_entry = unit.create_entry(from.id, -amount).await?;
    let to_entry = unit.create_entry(to.id, amount).await?;

    Ok(TransferResult {
        transfer,
        from_entry,
        to_entry,
        from_account: AccountSnapshot::from(&from_account),
        to_account: AccountSnapshot::from(&to_account),
    })
}
