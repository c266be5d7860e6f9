//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Validates it and calls the store or the transfer service
//! 3. Returns HTTP response (JSON, status code)

/// Account endpoints
pub mod accounts;
/// Liveness and storage probe
pub mod health;
/// Transfer endpoints
pub mod transfers;
