//! Database connection and repositories

pub mod episodes;
pub mod history;
pub mod movies;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

pub use episodes::{EpisodeRecord, EpisodeRepository};
pub use history::{HistoryEntry, HistoryRepository};
pub use movies::{MovieRecord, MovieRepository};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the SQLite database at `path` and
    /// ensure the schema exists.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("connecting to database")?;

        let db = Self { pool };
        db.init_schema().await?;
        info!(path = %path.display(), "Database ready");
        Ok(db)
    }

    /// In-memory database for tests
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn movies(&self) -> MovieRepository {
        MovieRepository::new(self.pool.clone())
    }

    pub fn episodes(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.pool.clone())
    }

    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.pool.clone())
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                imdb_id     TEXT PRIMARY KEY,
                date_added  TEXT,
                date_source TEXT NOT NULL,
                release_date TEXT,
                path        TEXT,
                has_video   INTEGER NOT NULL DEFAULT 0,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS episodes (
                series_id   TEXT NOT NULL,
                season      INTEGER NOT NULL,
                episode     INTEGER NOT NULL,
                date_added  TEXT,
                date_source TEXT NOT NULL,
                air_date    TEXT,
                video_path  TEXT,
                updated_at  TEXT NOT NULL,
                PRIMARY KEY (series_id, season, episode)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processing_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_key  TEXT NOT NULL,
                media_kind  TEXT NOT NULL,
                action      TEXT NOT NULL,
                detail      TEXT NOT NULL,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_history_entity ON processing_history (entity_key, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_series ON episodes (series_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
