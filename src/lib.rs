//! TMC Ledger Service
//!
//! REST service owning the two invariant-heavy cores of a telemedicine
//! platform: the TMC credit ledger (atomic balance mutation, transfers,
//! hierarchical commission fan-out) and the prescription signature service
//! (RSA-PSS signing, ICP-Brasil A3 certificate simulation, electronic
//! verification).
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, row-level locking)
//! - **Authentication**: API key with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! The library exposes [`app`] so the binary and the integration tests
//! build the same router.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use db::DbPool;
use tower_http::trace::TraceLayer;

/// Build the HTTP router.
///
/// All API routes sit behind the API key middleware; only `/health` is
/// public.
pub fn app(pool: DbPool) -> Router {
    let authenticated_routes = Router::new()
        // User management routes
        .route("/api/v1/users", post(handlers::users::create_user))
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        .route(
            "/api/v1/users/{id}/balance",
            get(handlers::users::get_balance),
        )
        .route(
            "/api/v1/users/{id}/transactions",
            get(handlers::users::list_transactions),
        )
        // Ledger routes
        .route(
            "/api/v1/credits/credit",
            post(handlers::credits::create_credit),
        )
        .route(
            "/api/v1/credits/debit",
            post(handlers::credits::create_debit),
        )
        .route(
            "/api/v1/credits/transfer",
            post(handlers::credits::create_transfer),
        )
        .route(
            "/api/v1/credits/recharge",
            post(handlers::credits::create_recharge),
        )
        .route(
            "/api/v1/credits/commission",
            post(handlers::credits::create_commission),
        )
        // Signature routes
        .route(
            "/api/v1/signatures/keypair",
            post(handlers::signatures::generate_keypair),
        )
        .route(
            "/api/v1/signatures/sign",
            post(handlers::signatures::sign_prescription),
        )
        .route(
            "/api/v1/signatures/verify",
            post(handlers::signatures::verify_signature),
        )
        .route(
            "/api/v1/signatures/electronic-verification",
            post(handlers::signatures::electronic_verification),
        )
        .route(
            "/api/v1/signatures/token-auth",
            post(handlers::signatures::authenticate_token),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}
