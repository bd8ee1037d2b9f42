//! Digital signature HTTP handlers.
//!
//! This module implements the signature API endpoints:
//! - POST /api/v1/signatures/keypair - Generate an RSA key pair
//! - POST /api/v1/signatures/sign - Sign a prescription
//! - POST /api/v1/signatures/verify - Verify a detached signature
//! - POST /api/v1/signatures/electronic-verification - Full verification report
//! - POST /api/v1/signatures/token-auth - Simulated A3 token PIN check

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::signature::{
        ElectronicVerificationRequest, KeyPair, SignRequest, SignResponse, TokenAuthRequest,
        TokenAuthResponse, VerificationReport, VerifyRequest, VerifyResponse,
    },
    services::signature_service,
};
use axum::{Extension, Json, extract::State};

/// Generate a fresh RSA 2048 key pair for a doctor.
///
/// Key generation is CPU-heavy, so it runs on the blocking thread pool.
pub async fn generate_keypair() -> Result<Json<KeyPair>, AppError> {
    let keys = tokio::task::spawn_blocking(signature_service::generate_key_pair)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "key generation task failed");
            AppError::SigningFailure
        })??;

    Ok(Json(keys))
}

/// Sign a prescription and record the signature event.
///
/// # Process
///
/// 1. Synthesize the (simulated) ICP-Brasil A3 certificate for the doctor
/// 2. Sign the document with the supplied private key
/// 3. Compute the audit hash over the signature event
/// 4. Append a `signature_events` row (hashes only, never the document)
///
/// # Response (200)
///
/// The full `SignatureResult` plus the audit hash.
pub async fn sign_prescription(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SignRequest>,
) -> Result<Json<SignResponse>, AppError> {
    let certificate = signature_service::create_icp_brasil_a3_certificate(
        request.doctor_id,
        &request.doctor_name,
        &request.crm,
        &request.crm_state,
    );

    let result = signature_service::sign_prescription(
        &request.document_content,
        &request.private_key,
        certificate,
    )?;

    let audit_hash =
        signature_service::generate_audit_hash(&result, request.doctor_id, request.patient_id);

    sqlx::query(
        r#"
        INSERT INTO signature_events (
            doctor_id,
            patient_id,
            document_hash,
            audit_hash,
            algorithm,
            signed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(request.doctor_id)
    .bind(request.patient_id)
    .bind(&result.document_hash)
    .bind(&audit_hash)
    .bind(&result.algorithm)
    .bind(result.certificate_info.signed_at)
    .execute(&pool)
    .await?;

    tracing::info!(
        service = %auth.service_name,
        doctor_id = %request.doctor_id,
        audit_hash = %audit_hash,
        "prescription signed"
    );

    Ok(Json(SignResponse { result, audit_hash }))
}

/// Verify a detached prescription signature.
///
/// Always responds 200; the body carries the verdict.
pub async fn verify_signature(
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let valid = signature_service::verify_signature(
        &request.document_content,
        &request.signature,
        &request.public_key,
        &request.timestamp,
    );

    Ok(Json(VerifyResponse { valid }))
}

/// Run the multi-stage electronic verification and return the report.
pub async fn electronic_verification(
    Json(request): Json<ElectronicVerificationRequest>,
) -> Result<Json<VerificationReport>, AppError> {
    let report = signature_service::perform_electronic_verification(
        &request.signature,
        &request.document_hash,
        &request.certificate_info,
    )
    .await;

    Ok(Json(report))
}

/// Authenticate against the (simulated) A3 hardware token.
pub async fn authenticate_token(
    Json(request): Json<TokenAuthRequest>,
) -> Result<Json<TokenAuthResponse>, AppError> {
    let authenticated =
        signature_service::authenticate_a3_token(&request.pin, &request.certificate_id).await?;

    Ok(Json(TokenAuthResponse {
        authenticated,
        certificate_id: request.certificate_id,
    }))
}
