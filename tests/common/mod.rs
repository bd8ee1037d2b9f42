// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a plain user with an initial balance.
pub async fn create_user(pool: &PgPool, name: &str, credits: i64) -> Result<Uuid> {
    create_doctor(pool, name, credits, None, 0).await
}

/// Insert a doctor with hierarchy fields set.
///
/// `percentage` is what THIS doctor takes from subordinates' earnings.
pub async fn create_doctor(
    pool: &PgPool,
    name: &str,
    credits: i64,
    superior: Option<Uuid>,
    percentage: i32,
) -> Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (full_name, role, tmc_credits, superior_doctor_id, percentage_from_inferiors)
        VALUES ($1, 'doctor', $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(credits)
    .bind(superior)
    .bind(percentage)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Read a user's balance straight from the table.
pub async fn balance(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let credits: i64 = sqlx::query_scalar("SELECT tmc_credits FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(credits)
}

/// Rewire a user's superior (used to build hierarchy cycles in tests).
pub async fn set_superior(pool: &PgPool, user_id: Uuid, superior_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE users SET superior_doctor_id = $1 WHERE id = $2")
        .bind(superior_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
