//! DateWarden - canonical "date added" resolution for media libraries
//!
//! Listens for Radarr/Sonarr webhooks, debounces them per title, resolves
//! one provenance-tagged acquisition date per movie or episode, and writes
//! it to the database and the NFO sidecar next to the media.

mod api;
mod config;
mod db;
mod services;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::services::provider::ReleaseKind;
use crate::services::{
    ArrClient, ArrFlavor, DateResolutionEngine, MovieProvider, PathValidator, Processor,
    ResolutionConfig, SeriesProvider, TmdbClient, WebhookBatcher,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub batcher: Arc<WebhookBatcher>,
}

fn resolution_config(config: &Config) -> ResolutionConfig {
    let mut release_date_priority: Vec<ReleaseKind> = config
        .release_date_priority
        .iter()
        .filter_map(|name| ReleaseKind::from_priority_name(name))
        .collect();
    if release_date_priority.is_empty() {
        tracing::warn!("RELEASE_DATE_PRIORITY has no recognized entries, using default order");
        release_date_priority = ResolutionConfig::default().release_date_priority;
    }

    ResolutionConfig {
        release_date_priority,
        enable_smart_date_validation: config.enable_smart_date_validation,
        max_release_date_gap_years: config.max_release_date_gap_years,
        prefer_release_dates_over_file_dates: config.prefer_release_dates_over_file_dates,
        allow_file_date_fallback: config.allow_file_date_fallback,
    }
}

fn arr_client(flavor: ArrFlavor, url: &Option<String>, key: &Option<String>) -> Option<ArrClient> {
    match (url, key) {
        (Some(url), Some(key)) => Some(ArrClient::new(flavor, url.clone(), key.clone())),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(Config::from_env()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datewarden=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DateWarden");

    let db = Database::connect(Path::new(&config.database_path)).await?;

    let radarr = arr_client(ArrFlavor::Radarr, &config.radarr_url, &config.radarr_api_key);
    let sonarr = arr_client(ArrFlavor::Sonarr, &config.sonarr_url, &config.sonarr_api_key);
    let tmdb = config
        .tmdb_api_key
        .as_ref()
        .map(|key| TmdbClient::new(key.clone(), config.tmdb_country.clone()));
    if radarr.is_none() {
        tracing::warn!("Radarr not configured, movie history tier disabled");
    }
    if sonarr.is_none() {
        tracing::warn!("Sonarr not configured, series history tier disabled");
    }
    if tmdb.is_none() {
        tracing::warn!("TMDB not configured, release-date tier disabled");
    }

    let res_config = resolution_config(&config);
    let movie_engine = DateResolutionEngine::new(
        Arc::new(MovieProvider::new(radarr, tmdb)),
        res_config.clone(),
    );
    let tv_engine =
        DateResolutionEngine::new(Arc::new(SeriesProvider::new(sonarr)), res_config);

    let validator = PathValidator::new(
        config.movie_paths.iter().map(PathBuf::from).collect(),
        config.tv_paths.iter().map(PathBuf::from).collect(),
    );

    let processor = Arc::new(Processor::new(
        db.clone(),
        movie_engine,
        tv_engine,
        validator,
        config.clone(),
    ));
    let batcher = Arc::new(WebhookBatcher::new(
        processor,
        Duration::from_secs_f64(config.batch_delay_secs),
        config.max_concurrent,
    ));
    tracing::info!(
        batch_delay_secs = config.batch_delay_secs,
        max_concurrent = config.max_concurrent,
        "Batcher initialized"
    );

    let state = AppState {
        config: config.clone(),
        db,
        batcher: batcher.clone(),
    };

    let app = Router::new()
        .merge(api::health::router())
        .merge(api::webhooks::router())
        .nest("/api", api::status::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Stop taking events and give in-flight passes a bounded grace period
    // to finish writing
    batcher.shutdown();
    if tokio::time::timeout(Duration::from_secs(30), batcher.drain())
        .await
        .is_err()
    {
        tracing::warn!("Grace period elapsed with passes still in flight");
    }
    tracing::info!("Shutdown complete");

    Ok(())
}
