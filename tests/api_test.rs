mod common;

use anyhow::Result;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tower::ServiceExt;

const TEST_KEY: &str = "test-api-key";

/// Register an API key the way the operations tooling would: insert its
/// SHA-256 hash.
async fn seed_api_key(pool: &PgPool) -> Result<()> {
    let key_hash = hex::encode(Sha256::digest(TEST_KEY.as_bytes()));
    sqlx::query("INSERT INTO api_keys (key_hash, service_name) VALUES ($1, 'test-suite')")
        .bind(key_hash)
        .execute(pool)
        .await?;

    Ok(())
}

fn authed_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {TEST_KEY}"))
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TEST_KEY}"))
        .body(Body::empty())
        .expect("request builds")
}

async fn json_body(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(request).await.expect("infallible")
}

#[sqlx::test(migrations = "./migrations")]
async fn health_is_public(pool: PgPool) -> Result<()> {
    let app = tmc_ledger_service::app(pool);

    let response = send(
        &app,
        Request::builder().uri("/health").body(Body::empty())?,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn api_routes_require_a_valid_key(pool: PgPool) -> Result<()> {
    seed_api_key(&pool).await?;
    let app = tmc_ledger_service::app(pool);

    // No Authorization header
    let response = send(
        &app,
        Request::builder()
            .uri("/api/v1/users")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"full_name":"X"}"#))?,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong key
    let response = send(
        &app,
        Request::builder()
            .uri("/api/v1/users")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer wrong-key")
            .body(Body::from(r#"{"full_name":"X"}"#))?,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "invalid_api_key");

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn credit_flow_over_http(pool: PgPool) -> Result<()> {
    seed_api_key(&pool).await?;
    let app = tmc_ledger_service::app(pool);

    // Register a user with 100 credits
    let response = send(
        &app,
        authed_post(
            "/api/v1/users",
            serde_json::json!({"full_name": "Paciente Teste", "initial_credits": 100}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let user = json_body(response).await?;
    let user_id = user["id"].as_str().expect("user id").to_string();
    assert_eq!(user["tmc_credits"], 100);

    // Overdraft is rejected as unprocessable, not an internal error
    let response = send(
        &app,
        authed_post(
            "/api/v1/credits/debit",
            serde_json::json!({"user_id": user_id, "amount": 150, "reason": "ai_triage"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "insufficient_credits");

    // A recharge then makes the debit possible
    let response = send(
        &app,
        authed_post(
            "/api/v1/credits/recharge",
            serde_json::json!({"user_id": user_id, "amount": 50, "method": "pix"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        authed_post(
            "/api/v1/credits/debit",
            serde_json::json!({"user_id": user_id, "amount": 150, "reason": "ai_triage"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let debit = json_body(response).await?;
    assert_eq!(debit["balance_before"], 150);
    assert_eq!(debit["balance_after"], 0);

    // Balance and history endpoints agree
    let response = send(&app, authed_get(&format!("/api/v1/users/{user_id}/balance"))).await;
    let body = json_body(response).await?;
    assert_eq!(body["tmc_credits"], 0);

    let response = send(
        &app,
        authed_get(&format!("/api/v1/users/{user_id}/transactions")),
    )
    .await;
    let history = json_body(response).await?;
    assert_eq!(history.as_array().expect("array").len(), 2);

    Ok(())
}

#[sqlx::test(migrations = "./migrations")]
async fn signature_flow_over_http(pool: PgPool) -> Result<()> {
    seed_api_key(&pool).await?;
    let app = tmc_ledger_service::app(pool.clone());

    // Doctor and patient must exist for the signature event record
    let doctor_id = common::create_doctor(&pool, "Dra. Ana", 0, None, 0).await?;
    let patient_id = common::create_user(&pool, "Paciente", 0).await?;

    // Provision a key pair
    let response = send(&app, authed_post("/api/v1/signatures/keypair", serde_json::json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let keys = json_body(response).await?;
    let public_key = keys["public_key"].as_str().expect("public key").to_string();
    let private_key = keys["private_key"].as_str().expect("private key").to_string();

    // Sign a prescription
    let document = "Rx: amoxicilina 500mg, 8/8h por 7 dias";
    let response = send(
        &app,
        authed_post(
            "/api/v1/signatures/sign",
            serde_json::json!({
                "document_content": document,
                "private_key": private_key,
                "doctor_id": doctor_id,
                "patient_id": patient_id,
                "doctor_name": "Dra. Ana",
                "crm": "123456",
                "crm_state": "SP",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let signed = json_body(response).await?;
    let signature = signed["signature"].as_str().expect("signature").to_string();
    let timestamp = signed["timestamp"].as_str().expect("timestamp").to_string();
    assert_eq!(signed["algorithm"], "RSA-PSS");
    assert_eq!(signed["audit_hash"].as_str().expect("audit hash").len(), 64);

    // The signing event was recorded
    let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM signature_events WHERE doctor_id = $1")
        .bind(doctor_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(events, 1);

    // Verification accepts the original document and rejects a tampered one
    let response = send(
        &app,
        authed_post(
            "/api/v1/signatures/verify",
            serde_json::json!({
                "document_content": document,
                "signature": signature,
                "public_key": public_key,
                "timestamp": timestamp,
            }),
        ),
    )
    .await;
    let body = json_body(response).await?;
    assert_eq!(body["valid"], true);

    let response = send(
        &app,
        authed_post(
            "/api/v1/signatures/verify",
            serde_json::json!({
                "document_content": "Rx: amoxicilina 500mg, 8/8h por 14 dias",
                "signature": signature,
                "public_key": public_key,
                "timestamp": timestamp,
            }),
        ),
    )
    .await;
    let body = json_body(response).await?;
    assert_eq!(body["valid"], false);

    // Short PINs are rejected by the token authentication
    let response = send(
        &app,
        authed_post(
            "/api/v1/signatures/token-auth",
            serde_json::json!({"pin": "12345", "certificate_id": "cert-1"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        authed_post(
            "/api/v1/signatures/token-auth",
            serde_json::json!({"pin": "123456", "certificate_id": "cert-1"}),
        ),
    )
    .await;
    let body = json_body(response).await?;
    assert_eq!(body["authenticated"], true);

    Ok(())
}
