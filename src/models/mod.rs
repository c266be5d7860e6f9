//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Bank account model
pub mod account;
/// Transfer and entry ledger models
pub mod transfer;
