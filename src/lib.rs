//! Simple bank - accounts and a money-transfer engine.
//!
//! The heart of the crate is
//! [`services::transfer_service::execute_transfer`], which moves funds
//! between two accounts atomically, locking account rows in ascending id
//! order so concurrent transfers neither lose updates nor deadlock.
//! Storage sits behind the [`store::Store`] trait with a PostgreSQL and an
//! in-memory backend; [`app::router`] exposes it all over HTTP.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
