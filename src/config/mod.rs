//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite database path
    pub database_path: String,

    /// Movie library root directories
    pub movie_paths: Vec<String>,

    /// TV library root directories
    pub tv_paths: Vec<String>,

    /// Debounce window for webhook batching, in seconds
    pub batch_delay_secs: f64,

    /// Maximum concurrent resolution passes
    pub max_concurrent: usize,

    /// Write managed sidecar files next to the media
    pub manage_sidecars: bool,

    /// Mark managed sidecar fields as locked so other tools leave them alone
    pub lock_metadata: bool,

    /// Rewrite media file/directory mtimes to the resolved date
    pub fix_dir_mtimes: bool,

    /// Permit the low-trust filesystem-mtime tier
    pub allow_file_date_fallback: bool,

    /// When import history only yields the manager's internal file-add time,
    /// prefer a reasonable release date instead
    pub prefer_release_dates_over_file_dates: bool,

    /// Release-date tier priority order (e.g. digital, physical, theatrical)
    pub release_date_priority: Vec<String>,

    /// Reject release-date candidates implausibly far after the theatrical date
    pub enable_smart_date_validation: bool,

    /// Maximum plausible gap (years) between theatrical and later release types
    pub max_release_date_gap_years: i32,

    /// Radarr base URL and API key
    pub radarr_url: Option<String>,
    pub radarr_api_key: Option<String>,

    /// Sonarr base URL and API key
    pub sonarr_url: Option<String>,
    pub sonarr_api_key: Option<String>,

    /// TMDB API key
    pub tmdb_api_key: Option<String>,

    /// Preferred country for TMDB release dates
    pub tmdb_country: String,
}

fn bool_env(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn clamped_f64(name: &str, default: f64, min: f64, max: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn clamped_i64(name: &str, default: i64, min: i64, max: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn path_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let release_priority = env::var("RELEASE_DATE_PRIORITY")
            .unwrap_or_else(|_| "digital,physical,theatrical".to_string());
        let release_date_priority: Vec<String> = release_priority
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/datewarden.db".to_string()),

            movie_paths: path_list("MOVIE_PATHS"),
            tv_paths: path_list("TV_PATHS"),

            batch_delay_secs: clamped_f64("BATCH_DELAY", 5.0, 0.1, 300.0),
            max_concurrent: clamped_i64("MAX_CONCURRENT", 3, 1, 10) as usize,

            manage_sidecars: bool_env("MANAGE_SIDECARS", true),
            lock_metadata: bool_env("LOCK_METADATA", true),
            fix_dir_mtimes: bool_env("FIX_DIR_MTIMES", true),

            allow_file_date_fallback: bool_env("ALLOW_FILE_DATE_FALLBACK", false),
            prefer_release_dates_over_file_dates: bool_env(
                "PREFER_RELEASE_DATES_OVER_FILE_DATES",
                true,
            ),

            release_date_priority,
            enable_smart_date_validation: bool_env("ENABLE_SMART_DATE_VALIDATION", true),
            max_release_date_gap_years: clamped_i64("MAX_RELEASE_DATE_GAP_YEARS", 10, 1, 50)
                as i32,

            radarr_url: env::var("RADARR_URL").ok(),
            radarr_api_key: env::var("RADARR_API_KEY").ok(),
            sonarr_url: env::var("SONARR_URL").ok(),
            sonarr_api_key: env::var("SONARR_API_KEY").ok(),

            tmdb_api_key: env::var("TMDB_API_KEY").ok(),
            tmdb_country: env::var("TMDB_COUNTRY").unwrap_or_else(|_| "US".to_string()),
        })
    }
}
