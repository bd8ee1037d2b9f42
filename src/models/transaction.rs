//! TMC transaction data models and API request/response types.
//!
//! This module defines:
//! - `CreditTransaction`: Database entity for one ledger entry
//! - Request types for credit, debit, transfer, recharge and commission
//! - `TransactionResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents one row of the append-only TMC ledger.
///
/// # Database Table
///
/// Maps to the `credit_transactions` table. Each row:
/// - Records a signed amount: positive for credit, negative for debit
/// - Snapshots the balance before and after the mutation
/// - Is written in the same database transaction as the balance update,
///   and never modified afterwards
///
/// Invariant (also a CHECK constraint):
/// `balance_after = balance_before + amount`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CreditTransaction {
    /// Unique identifier for this ledger entry
    pub id: Uuid,

    /// User whose balance this entry mutated
    pub user_id: Uuid,

    /// Type of transaction: "credit", "debit" or "transfer"
    ///
    /// Both legs of a transfer carry type "transfer"; the sign of `amount`
    /// distinguishes the outgoing leg from the incoming one.
    pub transaction_type: String,

    /// Signed amount in TMC credits
    ///
    /// Positive for credit and commission receipt, negative for debit.
    pub amount: i64,

    /// Human-readable reason for the mutation
    pub reason: String,

    /// Platform feature that triggered the mutation
    ///
    /// Examples: "ai_triage", "video_consultation", "recharge".
    pub function_used: Option<String>,

    /// Counterparty user, when one exists
    ///
    /// For transfers this is the other leg's user; for commission postings
    /// it is the subordinate doctor whose earnings triggered the posting.
    pub related_user_id: Option<Uuid>,

    /// Balance immediately before this entry was applied
    pub balance_before: i64,

    /// Balance immediately after this entry was applied
    pub balance_after: i64,

    /// Appointment that triggered the mutation, if any
    pub appointment_id: Option<Uuid>,

    /// Medical record that triggered the mutation, if any
    pub medical_record_id: Option<Uuid>,

    /// When this entry was created
    pub created_at: DateTime<Utc>,
}

/// Request to credit (add TMC to) a user.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount": 50,
///   "reason": "Appointment completed",
///   "function_used": "video_consultation",
///   "appointment_id": "660e8400-e29b-41d4-a716-446655440001"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub user_id: Uuid,

    /// Amount to add (must be positive)
    pub amount: i64,

    pub reason: String,

    pub function_used: Option<String>,

    pub related_user_id: Option<Uuid>,

    pub appointment_id: Option<Uuid>,

    pub medical_record_id: Option<Uuid>,
}

/// Request to debit (remove TMC from) a user.
///
/// # Validation
///
/// - Amount must be positive
/// - User must hold at least `amount` credits, otherwise the operation
///   fails with `insufficient_credits` and the balance is left untouched
#[derive(Debug, Deserialize)]
pub struct DebitRequest {
    pub user_id: Uuid,

    /// Amount to remove (must be positive)
    pub amount: i64,

    pub reason: String,

    pub function_used: Option<String>,

    pub related_user_id: Option<Uuid>,

    pub appointment_id: Option<Uuid>,

    pub medical_record_id: Option<Uuid>,
}

/// Request to transfer TMC between two users.
///
/// # Atomicity Guarantee
///
/// Both balances are updated in the same database transaction. If either
/// side fails, nothing is applied.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// User to transfer from (balance decreases)
    pub from_user_id: Uuid,

    /// User to transfer to (balance increases)
    pub to_user_id: Uuid,

    /// Amount to transfer (must be positive)
    pub amount: i64,

    pub reason: String,
}

/// Request to recharge a user's balance via an external payment method.
///
/// # JSON Example
///
/// ```json
/// {
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "amount": 200,
///   "method": "pix"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub user_id: Uuid,

    /// Amount purchased (must be positive)
    pub amount: i64,

    /// Payment method label, e.g. "pix", "credit_card"
    pub method: String,
}

/// Request to distribute hierarchical commission for a doctor's earnings.
///
/// Walks the doctor's superior chain (at most three levels) and credits
/// each superior with their percentage of the level below.
#[derive(Debug, Deserialize)]
pub struct CommissionRequest {
    /// Doctor whose earnings trigger the commission cascade
    pub doctor_id: Uuid,

    /// Base amount the doctor earned (must be positive)
    pub amount: i64,

    /// Platform feature that produced the earnings
    pub function_used: String,

    pub appointment_id: Option<Uuid>,
}

/// Response returned for single-entry ledger operations.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transaction_type: String,
    pub amount: i64,
    pub reason: String,
    pub function_used: Option<String>,
    pub related_user_id: Option<Uuid>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub appointment_id: Option<Uuid>,
    pub medical_record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransaction> for TransactionResponse {
    fn from(tx: CreditTransaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            transaction_type: tx.transaction_type,
            amount: tx.amount,
            reason: tx.reason,
            function_used: tx.function_used,
            related_user_id: tx.related_user_id,
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            appointment_id: tx.appointment_id,
            medical_record_id: tx.medical_record_id,
            created_at: tx.created_at,
        }
    }
}

/// Response returned for transfers: both legs of the movement.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Outgoing leg (negative amount, sender)
    pub debit: TransactionResponse,

    /// Incoming leg (positive amount, recipient)
    pub credit: TransactionResponse,
}
