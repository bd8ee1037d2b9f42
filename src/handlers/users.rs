//! User management HTTP handlers.
//!
//! This module implements the user-related API endpoints:
//! - POST /api/v1/users - Register a user
//! - GET /api/v1/users/:id - Get user by ID
//! - GET /api/v1/users/:id/balance - Read TMC balance
//! - GET /api/v1/users/:id/transactions - Ledger history

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        transaction::TransactionResponse,
        user::{BalanceResponse, CreateUserRequest, User, UserResponse},
    },
    services::ledger_service,
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

const VALID_ROLES: [&str; 3] = ["patient", "doctor", "admin"];

/// Register a new user.
///
/// # Request Body
///
/// ```json
/// {
///   "full_name": "Dra. Ana Souza",
///   "role": "doctor",
///   "crm": "123456",
///   "crm_state": "SP",
///   "superior_doctor_id": "550e8400-...",
///   "percentage_from_inferiors": 10
/// }
/// ```
///
/// # Validation
///
/// - `role` must be patient, doctor or admin
/// - `percentage_from_inferiors` must be 0-100
/// - `superior_doctor_id`, when given, must reference an existing user
pub async fn create_user(
    State(pool): State<DbPool>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if !VALID_ROLES.contains(&request.role.as_str()) {
        return Err(AppError::InvalidRequest(format!(
            "Unknown role: {}",
            request.role
        )));
    }

    if !(0..=100).contains(&request.percentage_from_inferiors) {
        return Err(AppError::InvalidRequest(
            "percentage_from_inferiors must be between 0 and 100".to_string(),
        ));
    }

    if request.initial_credits < 0 {
        return Err(AppError::InvalidRequest(
            "initial_credits must not be negative".to_string(),
        ));
    }

    // The superior must already exist
    if let Some(superior_id) = request.superior_doctor_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(superior_id)
            .fetch_one(&pool)
            .await?;
        if !exists {
            return Err(AppError::UserNotFound);
        }
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            full_name,
            role,
            tmc_credits,
            superior_doctor_id,
            percentage_from_inferiors,
            crm,
            crm_state
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(request.full_name)
    .bind(request.role)
    .bind(request.initial_credits)
    .bind(request.superior_doctor_id)
    .bind(request.percentage_from_inferiors)
    .bind(request.crm)
    .bind(request.crm_state)
    .fetch_one(&pool)
    .await?;

    Ok(Json(user.into()))
}

/// Get a user by ID.
pub async fn get_user(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Read a user's current TMC balance.
pub async fn get_balance(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, AppError> {
    let tmc_credits = ledger_service::get_user_balance(&pool, user_id).await?;

    Ok(Json(BalanceResponse {
        user_id,
        tmc_credits,
    }))
}

/// List a user's ledger entries in creation order.
pub async fn list_transactions(
    State(pool): State<DbPool>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    // 404 for unknown users rather than an empty history
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
    if !exists {
        return Err(AppError::UserNotFound);
    }

    let transactions = ledger_service::list_user_transactions(&pool, user_id).await?;

    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}
