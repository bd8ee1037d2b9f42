//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! The ledger service owns every TMC balance mutation; the signature
//! service owns key material, signing and verification.

pub mod ledger_service;
pub mod signature_service;
