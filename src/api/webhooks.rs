//! Manager webhook endpoints
//!
//! POST /webhook/radarr and /webhook/sonarr accept the managers' native
//! webhook payloads. Acquisition events (Download, Upgrade, Rename) are
//! normalized and queued on the batcher; grabs, deletes, health pings and
//! the like are acknowledged but ignored. A payload with no usable id is
//! rejected so the sender surfaces the misconfiguration.

use std::path::PathBuf;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::services::ident::MediaKind;
use crate::services::process::WebhookEvent;
use crate::AppState;

/// Event types that change what is on disk and therefore warrant a pass
const PROCESSED_EVENTS: &[&str] = &["Download", "Upgrade", "Rename"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrWebhook {
    event_type: Option<String>,
    movie: Option<RadarrMovie>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    imdb_id: Option<String>,
    tmdb_id: Option<i64>,
    folder_path: Option<PathBuf>,
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrWebhook {
    event_type: Option<String>,
    series: Option<SonarrSeries>,
    #[serde(default)]
    episodes: Vec<SonarrEpisode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    imdb_id: Option<String>,
    path: Option<PathBuf>,
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrEpisode {
    season_number: u32,
    episode_number: u32,
}

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub entity: Option<String>,
}

fn accepted(entity: String) -> (StatusCode, Json<WebhookResponse>) {
    (
        StatusCode::ACCEPTED,
        Json(WebhookResponse {
            status: "queued",
            entity: Some(entity),
        }),
    )
}

fn ignored() -> (StatusCode, Json<WebhookResponse>) {
    (
        StatusCode::OK,
        Json(WebhookResponse {
            status: "ignored",
            entity: None,
        }),
    )
}

fn rejected(reason: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "status": "rejected", "reason": reason })),
    )
}

async fn radarr_webhook(
    State(state): State<AppState>,
    Json(payload): Json<RadarrWebhook>,
) -> Result<(StatusCode, Json<WebhookResponse>), (StatusCode, Json<Value>)> {
    let event_type = payload.event_type.unwrap_or_default();
    if event_type == "Test" {
        info!("Radarr test webhook received");
        return Ok(ignored());
    }
    if !PROCESSED_EVENTS.contains(&event_type.as_str()) {
        return Ok(ignored());
    }

    let Some(movie) = payload.movie else {
        return Err(rejected("payload carries no movie"));
    };
    let id = movie
        .imdb_id
        .filter(|id| !id.is_empty())
        .or_else(|| movie.tmdb_id.map(|t| format!("tmdb-{t}")));
    let Some(id) = id else {
        warn!(title = ?movie.title, "Radarr webhook without a usable id");
        return Err(rejected("movie has neither imdb nor tmdb id"));
    };

    let key = MediaKind::Movie.entity_key(&id);
    let event = WebhookEvent {
        kind: MediaKind::Movie,
        entity_id: id,
        event_type,
        folder_path: movie.folder_path,
        episodes: Vec::new(),
    };
    info!(%key, event_type = %event.event_type, "Movie webhook queued");
    state.batcher.submit(key.clone(), event);
    Ok(accepted(key))
}

async fn sonarr_webhook(
    State(state): State<AppState>,
    Json(payload): Json<SonarrWebhook>,
) -> Result<(StatusCode, Json<WebhookResponse>), (StatusCode, Json<Value>)> {
    let event_type = payload.event_type.unwrap_or_default();
    if event_type == "Test" {
        info!("Sonarr test webhook received");
        return Ok(ignored());
    }
    if !PROCESSED_EVENTS.contains(&event_type.as_str()) {
        return Ok(ignored());
    }

    let Some(series) = payload.series else {
        return Err(rejected("payload carries no series"));
    };
    let Some(id) = series.imdb_id.filter(|id| !id.is_empty()) else {
        warn!(title = ?series.title, "Sonarr webhook without an imdb id");
        return Err(rejected("series has no imdb id"));
    };

    let key = MediaKind::Tv.entity_key(&id);
    let event = WebhookEvent {
        kind: MediaKind::Tv,
        entity_id: id,
        event_type,
        folder_path: series.path,
        episodes: payload
            .episodes
            .iter()
            .map(|e| (e.season_number, e.episode_number))
            .collect(),
    };
    info!(%key, event_type = %event.event_type, episodes = event.episodes.len(), "Series webhook queued");
    state.batcher.submit(key.clone(), event);
    Ok(accepted(key))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook/radarr", post(radarr_webhook))
        .route("/webhook/sonarr", post(sonarr_webhook))
}
