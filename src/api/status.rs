//! Queue and library status endpoints

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::HistoryEntry;
use crate::services::batcher::BatcherStatus;
use crate::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub queue: BatcherStatus,
    pub movies: i64,
    pub episodes: i64,
    pub sidecars_managed: bool,
}

async fn status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let movies = state
        .db
        .movies()
        .count()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let episodes = state
        .db
        .episodes()
        .count()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(StatusResponse {
        queue: state.batcher.status(),
        movies,
        episodes,
        sidecars_managed: state.config.manage_sidecars,
    }))
}

#[derive(Deserialize)]
struct HistoryQuery {
    entity: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    50
}

async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryEntry>>, (StatusCode, String)> {
    let limit = query.limit.clamp(1, 500);
    let entries = match &query.entity {
        Some(entity) => state.db.history().for_entity(entity, limit).await,
        None => state.db.history().recent(limit).await,
    }
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(entries))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/history", get(history))
}
