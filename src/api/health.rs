//! Liveness and readiness endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub database: bool,
    /// False once shutdown has begun and webhooks are being refused
    pub accepting_events: bool,
}

/// Liveness - always returns OK while the server is running
async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness - the service can only do useful work when the database
/// answers and the batcher is still taking events
async fn readyz(State(state): State<AppState>) -> Json<ReadyResponse> {
    let database = sqlx::query("SELECT 1")
        .fetch_one(state.db.pool())
        .await
        .is_ok();
    let accepting_events = state.batcher.is_accepting();

    Json(ReadyResponse {
        ready: database && accepting_events,
        database,
        accepting_events,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
