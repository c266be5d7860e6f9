//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle atomic units, validation, and complex operations.

pub mod transfer_service;
