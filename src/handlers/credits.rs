//! TMC ledger HTTP handlers.
//!
//! This module implements the credit-movement API endpoints:
//! - POST /api/v1/credits/credit - Add credits to a user
//! - POST /api/v1/credits/debit - Remove credits from a user
//! - POST /api/v1/credits/transfer - Move credits between users
//! - POST /api/v1/credits/recharge - Credit a purchased recharge
//! - POST /api/v1/credits/commission - Distribute hierarchical commission
//!
//! Handlers stay thin: every balance mutation goes through the ledger
//! service, which owns the locking and atomicity rules.

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::transaction::{
        CommissionRequest, CreditRequest, DebitRequest, RechargeRequest, TransactionResponse,
        TransferRequest, TransferResponse,
    },
    services::ledger_service::{self, EntryMeta},
};
use axum::{Extension, Json, extract::State};

/// Credit TMC to a user.
///
/// # Request Body
///
/// ```json
/// {
///   "user_id": "550e8400-...",
///   "amount": 50,
///   "reason": "Appointment completed",
///   "function_used": "video_consultation"
/// }
/// ```
pub async fn create_credit(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreditRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = ledger_service::process_credit(
        &pool,
        request.user_id,
        request.amount,
        &request.reason,
        EntryMeta {
            function_used: request.function_used.as_deref(),
            related_user_id: request.related_user_id,
            appointment_id: request.appointment_id,
            medical_record_id: request.medical_record_id,
        },
    )
    .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount = request.amount,
        "credit applied"
    );

    Ok(Json(transaction.into()))
}

/// Debit TMC from a user.
///
/// Responds 422 `insufficient_credits` when the user holds less than the
/// requested amount; the balance is left untouched.
pub async fn create_debit(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<DebitRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction = ledger_service::process_debit(
        &pool,
        request.user_id,
        request.amount,
        &request.reason,
        EntryMeta {
            function_used: request.function_used.as_deref(),
            related_user_id: request.related_user_id,
            appointment_id: request.appointment_id,
            medical_record_id: request.medical_record_id,
        },
    )
    .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount = request.amount,
        "debit applied"
    );

    Ok(Json(transaction.into()))
}

/// Transfer TMC between two users.
///
/// Both legs are applied in a single database transaction; either both
/// succeed or neither does.
pub async fn create_transfer(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let (outgoing, incoming) = ledger_service::transfer_credits(
        &pool,
        request.from_user_id,
        request.to_user_id,
        request.amount,
        &request.reason,
    )
    .await?;

    tracing::info!(
        service = %auth.service_name,
        from = %request.from_user_id,
        to = %request.to_user_id,
        amount = request.amount,
        "transfer applied"
    );

    Ok(Json(TransferResponse {
        debit: outgoing.into(),
        credit: incoming.into(),
    }))
}

/// Credit a recharge purchased through an external payment method.
pub async fn create_recharge(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RechargeRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let transaction =
        ledger_service::recharge_credits(&pool, request.user_id, request.amount, &request.method)
            .await?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %request.user_id,
        amount = request.amount,
        method = %request.method,
        "recharge applied"
    );

    Ok(Json(transaction.into()))
}

/// Distribute hierarchical commission for a doctor's earnings.
///
/// Returns the postings made, possibly an empty list when the doctor has
/// no superiors or every computed commission rounds to zero.
pub async fn create_commission(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CommissionRequest>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let postings = ledger_service::process_hierarchical_commission(
        &pool,
        request.doctor_id,
        request.amount,
        &request.function_used,
        request.appointment_id,
    )
    .await?;

    tracing::info!(
        service = %auth.service_name,
        doctor_id = %request.doctor_id,
        amount = request.amount,
        postings = postings.len(),
        "commission distributed"
    );

    Ok(Json(postings.into_iter().map(Into::into).collect()))
}
