//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates business logic to the services
//! 3. Returns an HTTP response (JSON, status code)

/// TMC ledger endpoints
pub mod credits;
/// Service health endpoint
pub mod health;
/// Digital signature endpoints
pub mod signatures;
/// User management endpoints
pub mod users;
