//! User data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity for platform users (patients, doctors, admins)
//! - `CreateUserRequest`: Request body for registering users
//! - `UserResponse` / `BalanceResponse`: Response bodies returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Each user:
/// - Carries the TMC credit balance as a non-negative integer
/// - May point at a superior doctor, forming the commission hierarchy
///
/// # Balance Storage
///
/// TMC credits are whole units stored as `i64`. The balance is only ever
/// changed by the ledger service, inside a database transaction that also
/// appends the matching `credit_transactions` row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    /// Unique identifier for this user
    pub id: Uuid,

    /// Full display name
    pub full_name: String,

    /// Platform role: "patient", "doctor" or "admin"
    pub role: String,

    /// Current TMC credit balance
    ///
    /// Must be >= 0 (enforced by database CHECK constraint).
    pub tmc_credits: i64,

    /// Superior doctor in the commission hierarchy, if any
    ///
    /// Hierarchy edges form a forest: each doctor has at most one superior.
    /// Commission postings walk these edges upward, at most three levels.
    pub superior_doctor_id: Option<Uuid>,

    /// Percentage (0-100) this user receives from credits earned by
    /// subordinate doctors
    pub percentage_from_inferiors: i32,

    /// CRM registration number (doctors only)
    pub crm: Option<String>,

    /// State of the CRM registration, e.g. "SP" (doctors only)
    pub crm_state: Option<String>,

    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance update
    pub updated_at: DateTime<Utc>,
}

/// Request body for registering a new user.
///
/// # JSON Example
///
/// ```json
/// {
///   "full_name": "Dra. Ana Souza",
///   "role": "doctor",
///   "crm": "123456",
///   "crm_state": "SP",
///   "superior_doctor_id": "550e8400-e29b-41d4-a716-446655440000",
///   "percentage_from_inferiors": 10
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,

    /// Defaults to "patient" if not provided
    #[serde(default = "default_role")]
    pub role: String,

    /// Initial TMC credit balance (defaults to 0)
    #[serde(default)]
    pub initial_credits: i64,

    pub superior_doctor_id: Option<Uuid>,

    /// Percentage this user takes from subordinates' earnings (0-100)
    #[serde(default)]
    pub percentage_from_inferiors: i32,

    pub crm: Option<String>,

    pub crm_state: Option<String>,
}

fn default_role() -> String {
    "patient".to_string()
}

/// Response body for user endpoints.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub role: String,
    pub tmc_credits: i64,
    pub superior_doctor_id: Option<Uuid>,
    pub percentage_from_inferiors: i32,
    pub crm: Option<String>,
    pub crm_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            role: user.role,
            tmc_credits: user.tmc_credits,
            superior_doctor_id: user.superior_doctor_id,
            percentage_from_inferiors: user.percentage_from_inferiors,
            crm: user.crm,
            crm_state: user.crm_state,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response body for the balance read endpoint.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub user_id: Uuid,
    pub tmc_credits: i64,
}
