//! Ledger service - Core business logic for TMC credit movements.
//!
//! This service owns every mutation of a user's TMC balance:
//! - Credits and debits
//! - Transfers between users
//! - Hierarchical commission fan-out
//! - Recharges via external payment methods
//!
//! # Atomicity Guarantees
//!
//! Every operation runs inside a single PostgreSQL transaction. The target
//! balance row is taken with `SELECT ... FOR UPDATE`, so two operations on
//! the same user serialize and every ledger row records a consistent
//! `balance_before`/`balance_after` pair. The balance update and the ledger
//! insert commit together or not at all.
//!
//! Balances must never be mutated outside this module.

use crate::{db::DbPool, error::AppError, models::transaction::CreditTransaction};
use sqlx::{Postgres, Transaction};
use std::collections::HashSet;
use uuid::Uuid;

/// Maximum depth of the commission hierarchy walk.
const MAX_COMMISSION_LEVELS: u32 = 3;

/// Optional context attached to a ledger entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntryMeta<'a> {
    /// Platform feature that triggered the mutation
    pub function_used: Option<&'a str>,

    /// Counterparty user, when one exists
    pub related_user_id: Option<Uuid>,

    pub appointment_id: Option<Uuid>,

    pub medical_record_id: Option<Uuid>,
}

/// One fully computed ledger entry, ready to be applied.
struct NewLedgerEntry<'a> {
    user_id: Uuid,
    transaction_type: &'a str,
    amount: i64,
    reason: &'a str,
    function_used: Option<&'a str>,
    related_user_id: Option<Uuid>,
    balance_before: i64,
    balance_after: i64,
    appointment_id: Option<Uuid>,
    medical_record_id: Option<Uuid>,
}

/// Lock a user's balance row for the remainder of the enclosing
/// database transaction and return the current balance.
///
/// Returns `None` when the user does not exist.
async fn lock_credits(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
) -> Result<Option<i64>, AppError> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT tmc_credits FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(balance)
}

/// Write the new balance and append the matching ledger row.
///
/// Caller must already hold the row lock (via [`lock_credits`]) and have
/// computed `balance_after = balance_before + amount`.
async fn apply_entry(
    tx: &mut Transaction<'_, Postgres>,
    entry: NewLedgerEntry<'_>,
) -> Result<CreditTransaction, AppError> {
    sqlx::query("UPDATE users SET tmc_credits = $1, updated_at = NOW() WHERE id = $2")
        .bind(entry.balance_after)
        .bind(entry.user_id)
        .execute(&mut **tx)
        .await?;

    let transaction = sqlx::query_as::<_, CreditTransaction>(
        r#"
        INSERT INTO credit_transactions (
            user_id,
            transaction_type,
            amount,
            reason,
            function_used,
            related_user_id,
            balance_before,
            balance_after,
            appointment_id,
            medical_record_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.transaction_type)
    .bind(entry.amount)
    .bind(entry.reason)
    .bind(entry.function_used)
    .bind(entry.related_user_id)
    .bind(entry.balance_before)
    .bind(entry.balance_after)
    .bind(entry.appointment_id)
    .bind(entry.medical_record_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(transaction)
}

/// Credit TMC to a user.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock the user's balance row
/// 3. Write the increased balance
/// 4. Append the ledger row
/// 5. Commit (or rollback on error)
///
/// # Errors
///
/// - `InvalidRequest`: Amount is zero or negative
/// - `UserNotFound`: User doesn't exist
/// - `Database`: Database error occurred
pub async fn process_credit(
    pool: &DbPool,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    meta: EntryMeta<'_>,
) -> Result<CreditTransaction, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let balance_before = lock_credits(&mut tx, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let transaction = apply_entry(
        &mut tx,
        NewLedgerEntry {
            user_id,
            transaction_type: "credit",
            amount,
            reason,
            function_used: meta.function_used,
            related_user_id: meta.related_user_id,
            balance_before,
            balance_after: balance_before + amount,
            appointment_id: meta.appointment_id,
            medical_record_id: meta.medical_record_id,
        },
    )
    .await?;

    tx.commit().await?;

    Ok(transaction)
}

/// Debit TMC from a user.
///
/// Insufficient credits is a normal outcome, surfaced uniformly as
/// `AppError::InsufficientCredits`; the balance is left untouched. After a
/// successful debit the balance is never negative.
pub async fn process_debit(
    pool: &DbPool,
    user_id: Uuid,
    amount: i64,
    reason: &str,
    meta: EntryMeta<'_>,
) -> Result<CreditTransaction, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let balance_before = lock_credits(&mut tx, user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    if balance_before < amount {
        tx.rollback().await?;
        return Err(AppError::InsufficientCredits);
    }

    let transaction = apply_entry(
        &mut tx,
        NewLedgerEntry {
            user_id,
            transaction_type: "debit",
            amount: -amount,
            reason,
            function_used: meta.function_used,
            related_user_id: meta.related_user_id,
            balance_before,
            balance_after: balance_before - amount,
            appointment_id: meta.appointment_id,
            medical_record_id: meta.medical_record_id,
        },
    )
    .await?;

    tx.commit().await?;

    Ok(transaction)
}

/// Transfer TMC between two users.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock BOTH balance rows, in ascending id order
/// 3. Check the sender's balance
/// 4. Write both balances, append both ledger rows
/// 5. Commit
///
/// Both rows are locked in ascending user-id order so that two transfers
/// crossing in opposite directions cannot deadlock.
///
/// Both legs carry `transaction_type = "transfer"` and reference each
/// other through `related_user_id`. Returns `(outgoing, incoming)`.
///
/// # Errors
///
/// - `InvalidRequest`: Amount not positive, or sender equals recipient
/// - `UserNotFound`: Either party doesn't exist
/// - `InsufficientCredits`: Sender holds less than `amount`
pub async fn transfer_credits(
    pool: &DbPool,
    from_user_id: Uuid,
    to_user_id: Uuid,
    amount: i64,
    reason: &str,
) -> Result<(CreditTransaction, CreditTransaction), AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    if from_user_id == to_user_id {
        return Err(AppError::InvalidRequest(
            "Cannot transfer to the same user".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // Deterministic lock order: ascending user id
    let ordered = if from_user_id < to_user_id {
        [from_user_id, to_user_id]
    } else {
        [to_user_id, from_user_id]
    };

    let mut balances = [0i64; 2];
    for (slot, id) in ordered.iter().enumerate() {
        balances[slot] = lock_credits(&mut tx, *id)
            .await?
            .ok_or(AppError::UserNotFound)?;
    }

    let from_balance = balances[if ordered[0] == from_user_id { 0 } else { 1 }];
    let to_balance = balances[if ordered[0] == to_user_id { 0 } else { 1 }];

    if from_balance < amount {
        tx.rollback().await?;
        return Err(AppError::InsufficientCredits);
    }

    let outgoing = apply_entry(
        &mut tx,
        NewLedgerEntry {
            user_id: from_user_id,
            transaction_type: "transfer",
            amount: -amount,
            reason,
            function_used: Some("transfer"),
            related_user_id: Some(to_user_id),
            balance_before: from_balance,
            balance_after: from_balance - amount,
            appointment_id: None,
            medical_record_id: None,
        },
    )
    .await?;

    let incoming = apply_entry(
        &mut tx,
        NewLedgerEntry {
            user_id: to_user_id,
            transaction_type: "transfer",
            amount,
            reason,
            function_used: Some("transfer"),
            related_user_id: Some(from_user_id),
            balance_before: to_balance,
            balance_after: to_balance + amount,
            appointment_id: None,
            medical_record_id: None,
        },
    )
    .await?;

    tx.commit().await?;

    Ok((outgoing, incoming))
}

/// Row shape for one step of the hierarchy walk.
#[derive(sqlx::FromRow)]
struct HierarchyLink {
    superior_id: Uuid,
    percentage: i32,
}

/// Distribute hierarchical commission for credits earned by a doctor.
///
/// Walks the `superior_doctor_id` chain upward from `doctor_id`, at most
/// three levels. At each level the superior receives
/// `floor(carried * percentage_from_inferiors / 100)` where `carried` is
/// the PREVIOUS level's commission, not the original amount - each level
/// takes its cut of the level below, so commissions shrink geometrically.
///
/// The walk stops early when a node has no superior, a computed commission
/// rounds to zero, or a hierarchy cycle is detected (misconfigured data;
/// logged and bounded by a visited set).
///
/// All postings of one invocation share a single database transaction:
/// a failure partway rolls back every posting already made.
///
/// Returns the created ledger rows, possibly empty.
pub async fn process_hierarchical_commission(
    pool: &DbPool,
    doctor_id: Uuid,
    amount: i64,
    function_used: &str,
    appointment_id: Option<Uuid>,
) -> Result<Vec<CreditTransaction>, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let doctor_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(doctor_id)
        .fetch_one(&mut *tx)
        .await?;

    if !doctor_exists {
        tx.rollback().await?;
        return Err(AppError::UserNotFound);
    }

    let mut postings = Vec::new();
    let mut visited: HashSet<Uuid> = HashSet::from([doctor_id]);
    let mut current = doctor_id;
    let mut carried = amount;

    for level in 1..=MAX_COMMISSION_LEVELS {
        // Resolve the current node's superior and the percentage the
        // superior takes from inferiors
        let link = sqlx::query_as::<_, HierarchyLink>(
            r#"
            SELECT s.id AS superior_id, s.percentage_from_inferiors AS percentage
            FROM users u
            JOIN users s ON s.id = u.superior_doctor_id
            WHERE u.id = $1
            "#,
        )
        .bind(current)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(link) = link else {
            break;
        };

        if !visited.insert(link.superior_id) {
            tracing::warn!(
                doctor_id = %doctor_id,
                superior_id = %link.superior_id,
                "hierarchy cycle detected, stopping commission walk"
            );
            break;
        }

        let commission = carried * i64::from(link.percentage) / 100;
        if commission <= 0 {
            break;
        }

        let balance_before = lock_credits(&mut tx, link.superior_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let reason = format!("Hierarchical commission level {level} ({function_used})");
        let transaction = apply_entry(
            &mut tx,
            NewLedgerEntry {
                user_id: link.superior_id,
                transaction_type: "credit",
                amount: commission,
                reason: &reason,
                function_used: Some(function_used),
                related_user_id: Some(doctor_id),
                balance_before,
                balance_after: balance_before + commission,
                appointment_id,
                medical_record_id: None,
            },
        )
        .await?;
        postings.push(transaction);

        // Next level takes its percentage of THIS commission
        carried = commission;
        current = link.superior_id;
    }

    tx.commit().await?;

    Ok(postings)
}

/// Recharge a user's balance via an external payment method.
///
/// Named wrapper over [`process_credit`] with `function_used = "recharge"`.
pub async fn recharge_credits(
    pool: &DbPool,
    user_id: Uuid,
    amount: i64,
    method: &str,
) -> Result<CreditTransaction, AppError> {
    let reason = format!("Credit recharge via {method}");
    process_credit(
        pool,
        user_id,
        amount,
        &reason,
        EntryMeta {
            function_used: Some("recharge"),
            ..EntryMeta::default()
        },
    )
    .await
}

/// Read a user's current TMC balance.
pub async fn get_user_balance(pool: &DbPool, user_id: Uuid) -> Result<i64, AppError> {
    let balance: i64 = sqlx::query_scalar("SELECT tmc_credits FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(balance)
}

/// List a user's ledger entries in creation order.
///
/// Replaying the returned rows from the user's initial balance reproduces
/// the current balance exactly.
pub async fn list_user_transactions(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<Vec<CreditTransaction>, AppError> {
    let transactions = sqlx::query_as::<_, CreditTransaction>(
        "SELECT * FROM credit_transactions WHERE user_id = $1 ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}
