//! Concrete release-info providers
//!
//! [`MovieProvider`] joins the movie manager's history with TMDB release
//! dates; [`SeriesProvider`] serves everything from the TV manager. Each
//! client is optional so a half-configured deployment still resolves
//! from whatever sources it has.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::arr::ArrClient;
use super::provider::{HistoryEvent, ReleaseCandidate, ReleaseInfoProvider};
use super::tmdb::TmdbClient;

pub struct MovieProvider {
    radarr: Option<ArrClient>,
    tmdb: Option<TmdbClient>,
}

impl MovieProvider {
    pub fn new(radarr: Option<ArrClient>, tmdb: Option<TmdbClient>) -> Self {
        Self { radarr, tmdb }
    }
}

#[async_trait]
impl ReleaseInfoProvider for MovieProvider {
    async fn import_history(&self, entity_id: &str) -> Result<Vec<HistoryEvent>> {
        match &self.radarr {
            Some(client) => client.history(entity_id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn release_dates(&self, entity_id: &str) -> Result<Vec<ReleaseCandidate>> {
        match &self.tmdb {
            Some(client) => client.release_dates(entity_id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn file_added_date(&self, entity_id: &str) -> Result<Option<DateTime<Utc>>> {
        match &self.radarr {
            Some(client) => client.movie_file_added(entity_id).await,
            None => Ok(None),
        }
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

pub struct SeriesProvider {
    sonarr: Option<ArrClient>,
}

impl SeriesProvider {
    pub fn new(sonarr: Option<ArrClient>) -> Self {
        Self { sonarr }
    }
}

#[async_trait]
impl ReleaseInfoProvider for SeriesProvider {
    async fn import_history(&self, entity_id: &str) -> Result<Vec<HistoryEvent>> {
        match &self.sonarr {
            Some(client) => client.history(entity_id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn release_dates(&self, _entity_id: &str) -> Result<Vec<ReleaseCandidate>> {
        // Series dates come per-episode through the air-date lookup
        Ok(Vec::new())
    }

    async fn file_added_date(&self, _entity_id: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    async fn episode_air_date(
        &self,
        entity_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Option<DateTime<Utc>>> {
        match &self.sonarr {
            Some(client) => client.episode_air_date(entity_id, season, episode).await,
            None => Ok(None),
        }
    }
}
