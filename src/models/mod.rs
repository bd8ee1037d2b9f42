//! Data models representing database entities and API payloads.

/// API key authentication model
pub mod api_key;
/// Digital signature payloads
pub mod signature;
/// TMC ledger entries
pub mod transaction;
/// Platform users and hierarchy
pub mod user;
