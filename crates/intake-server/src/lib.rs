//! intake-server — the HTTP surface.
//!
//! Exposes the enrollment wizard as a JSON API and the admin portal behind
//! signed-token authentication. All business rules live in `intake-core`;
//! handlers here translate HTTP to core calls and errors to responses.

pub mod auth;
pub mod error;
pub mod routes_admin;
pub mod routes_wizard;
pub mod state;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use intake_stores::IntakeConfig;

use crate::state::SharedState;

/// Build the application router over a prepared state.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/enrollment/start", post(routes_wizard::start))
        .route("/api/enrollment/:session", get(routes_wizard::status))
        .route(
            "/api/enrollment/:session/questions",
            get(routes_wizard::questions),
        )
        .route(
            "/api/enrollment/:session/assessment",
            post(routes_wizard::submit_assessment),
        )
        .route("/api/enrollment/:session/retake", post(routes_wizard::retake))
        .route(
            "/api/enrollment/:session/personal-details",
            post(routes_wizard::submit_personal_details),
        )
        .route(
            "/api/enrollment/:session/declaration",
            post(routes_wizard::submit_declaration),
        )
        .route(
            "/api/enrollment/:session/documents",
            post(routes_wizard::upload_documents),
        )
        .route(
            "/api/enrollment/:session/complete",
            post(routes_wizard::complete),
        )
        .route("/api/admin/students", get(routes_admin::list_students))
        .route("/api/admin/students/:id", get(routes_admin::get_student))
        .route(
            "/api/admin/students/:id/reset-attempts",
            post(routes_admin::reset_attempts),
        )
        .route(
            "/api/admin/students/:id/documents",
            get(routes_admin::student_documents),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Assemble state from configuration and serve until shutdown.
pub async fn run(config: IntakeConfig) -> Result<()> {
    let state = state::AppState::from_config(&config)?;
    let bind_addr = config.server.bind_addr.clone();
    let app = build_router(state);

    info!("intake listening on http://{bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
