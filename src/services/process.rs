//! Per-entity processing pass
//!
//! One pass per debounced batch: validate the path, resolve the canonical
//! date, write the sidecar, persist the record, append to the audit
//! history. Passes for different entities are independent; the batcher
//! guarantees at most one pass per entity at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::db::Database;

use super::ident::{self, MediaKind};
use super::pathcheck::PathValidator;
use super::provenance::{DateRecord, Provenance, ProvenanceKind};
use super::resolve::{self, DateResolutionEngine, ResolveContext};
use super::sidecar::SidecarStore;

/// Normalized webhook payload, all manager-specific shape stripped off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub kind: MediaKind,
    pub entity_id: String,
    pub event_type: String,
    pub folder_path: Option<PathBuf>,
    /// Episodes named by the webhook; empty means "whole title"
    pub episodes: Vec<(u32, u32)>,
}

/// Seam between the batcher and the processing pipeline
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle(&self, key: &str, event: WebhookEvent) -> Result<()>;
}

pub struct Processor {
    db: Database,
    movie_engine: DateResolutionEngine,
    tv_engine: DateResolutionEngine,
    validator: PathValidator,
    sidecars: SidecarStore,
    config: Arc<Config>,
}

impl Processor {
    pub fn new(
        db: Database,
        movie_engine: DateResolutionEngine,
        tv_engine: DateResolutionEngine,
        validator: PathValidator,
        config: Arc<Config>,
    ) -> Self {
        let sidecars = SidecarStore::new(config.lock_metadata);
        Self {
            db,
            movie_engine,
            tv_engine,
            validator,
            sidecars,
            config,
        }
    }

    async fn process_movie(&self, event: &WebhookEvent, dir: &Path) -> Result<()> {
        let id = event.entity_id.as_str();
        let sidecar_path = dir.join("movie.nfo");
        let existing = self.db.movies().get_record(id).await?;

        // Already resolved from a real lookup and the sidecar agrees:
        // nothing left to do for this title.
        if let Some(existing) = &existing {
            if existing.is_query_backed() && self.sidecar_complete(&sidecar_path, existing) {
                debug!(id, "Record complete, skipping");
                return Ok(());
            }
        }

        let has_video = resolve::has_video_files(dir);
        if !has_video {
            warn!(id, path = %dir.display(), "No media files present yet");
        }

        let ctx = ResolveContext {
            media_path: Some(dir),
            sidecar_path: Some(&sidecar_path),
            episode: None,
            should_query: true,
            existing: existing.as_ref(),
        };
        let record = self.finalize(self.movie_engine.resolve(id, ctx).await);

        self.write_outputs(dir, &sidecar_path, "movie", &record)?;
        self.db.movies().upsert(id, &record, dir, has_video).await?;
        self.db
            .history()
            .append(
                &event.kind.entity_key(id),
                event.kind.as_str(),
                &event.event_type,
                &record.source.to_string(),
            )
            .await?;

        info!(id, date = ?record.date, source = %record.source, "Movie updated");
        Ok(())
    }

    async fn process_series(&self, event: &WebhookEvent, dir: &Path) -> Result<()> {
        let id = event.entity_id.as_str();
        let episode_files = find_episode_files(dir);
        if episode_files.is_empty() {
            warn!(id, path = %dir.display(), "No episode files found");
        }

        let mut updated = 0usize;
        for (season, episode, video_path) in episode_files {
            // A webhook naming specific episodes scopes the pass to them;
            // an unscoped webhook refreshes the whole series.
            if !event.episodes.is_empty() && !event.episodes.contains(&(season, episode)) {
                continue;
            }

            let sidecar_path = video_path.with_extension("nfo");
            let existing = self.db.episodes().get_record(id, season, episode).await?;
            if let Some(existing) = &existing {
                if existing.is_query_backed() && self.sidecar_complete(&sidecar_path, existing) {
                    continue;
                }
            }

            let ctx = ResolveContext {
                media_path: Some(dir),
                sidecar_path: Some(&sidecar_path),
                episode: Some((season, episode)),
                should_query: true,
                existing: existing.as_ref(),
            };
            let record = self.finalize(self.tv_engine.resolve(id, ctx).await);

            self.write_outputs(dir, &sidecar_path, "episodedetails", &record)?;
            self.db
                .episodes()
                .upsert(id, season, episode, &record, video_path.to_str())
                .await?;
            updated += 1;
        }

        self.db
            .history()
            .append(
                &event.kind.entity_key(id),
                event.kind.as_str(),
                &event.event_type,
                &format!("{updated} episodes updated"),
            )
            .await?;
        info!(id, updated, "Series updated");
        Ok(())
    }

    /// A webhook pass must leave a dated record behind even when every
    /// tier failed, so the library stays sortable. The fallback stamp is
    /// not query-backed and a later pass will retry the real tiers.
    fn finalize(&self, record: DateRecord) -> DateRecord {
        if record.date.is_some() {
            return record;
        }
        info!("All tiers empty, stamping current time as fallback");
        DateRecord::new(Utc::now(), Provenance::new(ProvenanceKind::WebhookFallback))
    }

    fn sidecar_complete(&self, sidecar_path: &Path, record: &DateRecord) -> bool {
        if !self.config.manage_sidecars {
            return true;
        }
        SidecarStore::read(sidecar_path)
            .and_then(|data| data.cached_record())
            .map(|cached| cached.date == record.date && cached.source.kind == record.source.kind)
            .unwrap_or(false)
    }

    fn write_outputs(
        &self,
        dir: &Path,
        sidecar_path: &Path,
        root_name: &str,
        record: &DateRecord,
    ) -> Result<()> {
        if self.config.manage_sidecars {
            self.sidecars
                .write(sidecar_path, root_name, record)
                .with_context(|| format!("writing sidecar {}", sidecar_path.display()))?;
        }
        if self.config.fix_dir_mtimes {
            if let Some(date) = record.date {
                let mtime = FileTime::from_unix_time(date.timestamp(), 0);
                if let Err(e) = filetime::set_file_mtime(dir, mtime) {
                    warn!(path = %dir.display(), error = %e, "Could not adjust directory mtime");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BatchHandler for Processor {
    async fn handle(&self, key: &str, event: WebhookEvent) -> Result<()> {
        let dir = match &event.folder_path {
            Some(path) => path.clone(),
            None => self
                .validator
                .find_title_dir(event.kind, &event.entity_id)
                .with_context(|| format!("no library directory found for {key}"))?,
        };

        self.validator
            .validate(event.kind, &event.entity_id, &dir)
            .map_err(|reason| anyhow::anyhow!(reason))
            .context("path validation failed, pass aborted")?;

        match event.kind {
            MediaKind::Movie => self.process_movie(&event, &dir).await,
            MediaKind::Tv => self.process_series(&event, &dir).await,
        }
    }
}

/// All episode video files under a series directory with their parsed
/// season/episode numbers
fn find_episode_files(dir: &Path) -> Vec<(u32, u32, PathBuf)> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).max_depth(3).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_video = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| resolve::VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if !is_video {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some((season, episode)) = ident::extract_episode_numbers(name) {
            found.push((season, episode, path.to_path_buf()));
        }
    }
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::{HistoryEvent, ReleaseCandidate, ReleaseInfoProvider};
    use chrono::DateTime;
    use std::fs;
    use tempfile::TempDir;

    struct NoDataProvider;

    #[async_trait]
    impl ReleaseInfoProvider for NoDataProvider {
        async fn import_history(&self, _entity_id: &str) -> Result<Vec<HistoryEvent>> {
            Ok(Vec::new())
        }
        async fn release_dates(&self, _entity_id: &str) -> Result<Vec<ReleaseCandidate>> {
            Ok(Vec::new())
        }
        async fn file_added_date(&self, _entity_id: &str) -> Result<Option<DateTime<Utc>>> {
            Ok(None)
        }
        async fn episode_air_date(
            &self,
            _entity_id: &str,
            _season: u32,
            _episode: u32,
        ) -> Result<Option<DateTime<Utc>>> {
            Ok(None)
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            database_path: String::new(),
            movie_paths: Vec::new(),
            tv_paths: Vec::new(),
            batch_delay_secs: 0.1,
            max_concurrent: 1,
            manage_sidecars: true,
            lock_metadata: true,
            fix_dir_mtimes: false,
            allow_file_date_fallback: false,
            prefer_release_dates_over_file_dates: true,
            release_date_priority: vec!["digital".into(), "physical".into(), "theatrical".into()],
            enable_smart_date_validation: true,
            max_release_date_gap_years: 10,
            radarr_url: None,
            radarr_api_key: None,
            sonarr_url: None,
            sonarr_api_key: None,
            tmdb_api_key: None,
            tmdb_country: "US".into(),
        }
    }

    fn test_processor(db: &Database, movie_root: &Path) -> Processor {
        let provider: Arc<dyn ReleaseInfoProvider> = Arc::new(NoDataProvider);
        let movie_engine =
            DateResolutionEngine::new(provider.clone(), resolve::ResolutionConfig::default());
        let tv_engine = DateResolutionEngine::new(provider, resolve::ResolutionConfig::default());
        Processor::new(
            db.clone(),
            movie_engine,
            tv_engine,
            PathValidator::new(vec![movie_root.to_path_buf()], Vec::new()),
            Arc::new(test_config()),
        )
    }

    fn movie_event(id: &str, dir: &Path) -> WebhookEvent {
        WebhookEvent {
            kind: MediaKind::Movie,
            entity_id: id.to_string(),
            event_type: "Download".to_string(),
            folder_path: Some(dir.to_path_buf()),
            episodes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_id_mismatch_aborts_before_any_write() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Other Movie (2001) [imdb-tt0000002]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Other Movie (2001).mkv"), b"x").unwrap();

        let db = Database::connect_in_memory().await.unwrap();
        let processor = test_processor(&db, tmp.path());

        // webhook claims tt0000001 but the directory carries tt0000002
        let result = processor
            .handle("movie:tt0000001", movie_event("tt0000001", &dir))
            .await;

        assert!(result.is_err());
        assert_eq!(db.movies().count().await.unwrap(), 0);
        assert!(db.history().recent(10).await.unwrap().is_empty());
        assert!(!dir.join("movie.nfo").exists());
    }

    #[tokio::test]
    async fn test_handle_writes_once_validation_passes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Some Movie (2001) [imdb-tt0000001]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Some Movie (2001).mkv"), b"x").unwrap();

        let db = Database::connect_in_memory().await.unwrap();
        let processor = test_processor(&db, tmp.path());

        processor
            .handle("movie:tt0000001", movie_event("tt0000001", &dir))
            .await
            .unwrap();

        let record = db.movies().get_record("tt0000001").await.unwrap().unwrap();
        assert!(record.date.is_some());
        assert_eq!(record.source.kind, ProvenanceKind::WebhookFallback);
        assert!(dir.join("movie.nfo").exists());
        assert_eq!(db.history().recent(10).await.unwrap().len(), 1);
    }

    #[test]
    fn test_find_episode_files() {
        let tmp = TempDir::new().unwrap();
        let season_dir = tmp.path().join("Season 01");
        fs::create_dir(&season_dir).unwrap();
        fs::write(season_dir.join("Show S01E01 1080p.mkv"), b"x").unwrap();
        fs::write(season_dir.join("Show S01E02 1080p.mkv"), b"x").unwrap();
        fs::write(season_dir.join("Show S01E01 1080p.nfo"), b"x").unwrap();
        fs::write(season_dir.join("poster.jpg"), b"x").unwrap();

        let files = find_episode_files(tmp.path());
        assert_eq!(files.len(), 2);
        assert_eq!((files[0].0, files[0].1), (1, 1));
        assert_eq!((files[1].0, files[1].1), (1, 2));
    }
}
