//! Radarr/Sonarr v3 API clients
//!
//! Both managers expose the same shapes for the endpoints used here:
//! a library listing to map an external id to an internal one, and a
//! paged history resource. Event types arrive as strings from current
//! versions and as numeric codes from older ones; both are accepted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ident;
use super::provider::{HistoryEvent, HistoryEventKind};

const HISTORY_PAGE_SIZE: u32 = 100;
const MAX_HISTORY_PAGES: u32 = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibraryItem {
    id: i64,
    imdb_id: Option<String>,
    #[serde(default)]
    movie_file: Option<MediaFileInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaFileInfo {
    date_added: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryPage {
    total_records: u64,
    records: Vec<HistoryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRecord {
    event_type: Value,
    date: DateTime<Utc>,
    source_title: Option<String>,
    #[serde(default)]
    data: Value,
}

impl HistoryRecord {
    fn kind(&self) -> HistoryEventKind {
        match &self.event_type {
            Value::Number(n) => n
                .as_i64()
                .map(HistoryEventKind::from_code)
                .unwrap_or(HistoryEventKind::Other),
            Value::String(s) => kind_from_name(s),
            _ => HistoryEventKind::Other,
        }
    }

    fn into_event(self) -> HistoryEvent {
        let kind = self.kind();
        let data_str = |key: &str| {
            self.data
                .get(key)
                .and_then(|v| v.as_str())
                .map(String::from)
        };
        HistoryEvent {
            kind,
            date: self.date,
            source_text: data_str("droppedPath")
                .or(data_str("importedPath"))
                .or(self.source_title),
            indexer: data_str("indexer"),
        }
    }
}

fn kind_from_name(name: &str) -> HistoryEventKind {
    match name {
        "grabbed" => HistoryEventKind::Grabbed,
        "downloadFolderImported" | "movieFolderImported" => HistoryEventKind::Imported,
        "downloadFailed" => HistoryEventKind::Failed,
        s if s.ends_with("Renamed") => HistoryEventKind::Renamed,
        s if s.ends_with("Retagged") => HistoryEventKind::Retagged,
        _ => HistoryEventKind::Other,
    }
}

/// Which manager a client talks to; selects the library resource and the
/// history filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrFlavor {
    Radarr,
    Sonarr,
}

impl ArrFlavor {
    fn library_resource(&self) -> &'static str {
        match self {
            Self::Radarr => "movie",
            Self::Sonarr => "series",
        }
    }

    fn history_filter(&self) -> &'static str {
        match self {
            Self::Radarr => "movieId",
            Self::Sonarr => "seriesId",
        }
    }
}

pub struct ArrClient {
    client: Client,
    base_url: String,
    api_key: String,
    flavor: ArrFlavor,
}

impl ArrClient {
    pub fn new(flavor: ArrFlavor, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            flavor,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/api/v3/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(query)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("{url} returned status {}", response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("parsing response from {url}"))
    }

    /// Find the manager's library entry for an external id
    async fn find_item(&self, imdb_id: &str) -> Result<Option<LibraryItem>> {
        let items: Vec<LibraryItem> = self
            .get_json(self.flavor.library_resource(), &[])
            .await?;
        Ok(items.into_iter().find(|item| {
            item.imdb_id
                .as_deref()
                .map(|found| ident::ids_match(found, imdb_id))
                .unwrap_or(false)
        }))
    }

    /// Full history for a title, oldest first. A title the manager does
    /// not know yields an empty list.
    pub async fn history(&self, imdb_id: &str) -> Result<Vec<HistoryEvent>> {
        let Some(item) = self.find_item(imdb_id).await? else {
            debug!(imdb_id, "Title not in manager library");
            return Ok(Vec::new());
        };

        let mut events = Vec::new();
        for page in 1..=MAX_HISTORY_PAGES {
            let result: HistoryPage = self
                .get_json(
                    "history",
                    &[
                        ("page", page.to_string()),
                        ("pageSize", HISTORY_PAGE_SIZE.to_string()),
                        ("sortKey", "date".to_string()),
                        ("sortDirection", "ascending".to_string()),
                        (self.flavor.history_filter(), item.id.to_string()),
                    ],
                )
                .await?;

            let total = result.total_records;
            events.extend(result.records.into_iter().map(HistoryRecord::into_event));
            if events.len() as u64 >= total {
                break;
            }
            if page == MAX_HISTORY_PAGES {
                warn!(imdb_id, total, "History truncated at page limit");
            }
        }

        events.sort_by_key(|e| e.date);
        debug!(imdb_id, count = events.len(), "Fetched history");
        Ok(events)
    }

    /// The manager's own file-added timestamp for a movie
    pub async fn movie_file_added(&self, imdb_id: &str) -> Result<Option<DateTime<Utc>>> {
        let item = self.find_item(imdb_id).await?;
        Ok(item.and_then(|i| i.movie_file).and_then(|f| f.date_added))
    }

    /// Air date for one episode of a series
    pub async fn episode_air_date(
        &self,
        imdb_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Option<DateTime<Utc>>> {
        let Some(item) = self.find_item(imdb_id).await? else {
            return Ok(None);
        };

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Episode {
            season_number: u32,
            episode_number: u32,
            air_date_utc: Option<DateTime<Utc>>,
        }

        let episodes: Vec<Episode> = self
            .get_json("episode", &[("seriesId", item.id.to_string())])
            .await?;

        Ok(episodes
            .into_iter()
            .find(|e| e.season_number == season && e.episode_number == episode)
            .and_then(|e| e.air_date_utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_from_api_strings() {
        assert_eq!(kind_from_name("grabbed"), HistoryEventKind::Grabbed);
        assert_eq!(
            kind_from_name("downloadFolderImported"),
            HistoryEventKind::Imported
        );
        assert_eq!(kind_from_name("movieFileRenamed"), HistoryEventKind::Renamed);
        assert_eq!(
            kind_from_name("episodeFileRenamed"),
            HistoryEventKind::Renamed
        );
        assert_eq!(kind_from_name("downloadFailed"), HistoryEventKind::Failed);
        assert_eq!(kind_from_name("episodeFileDeleted"), HistoryEventKind::Other);
    }

    #[test]
    fn test_history_record_accepts_codes_and_names() {
        let from_name: HistoryRecord = serde_json::from_str(
            r#"{"eventType": "grabbed", "date": "2022-01-01T00:00:00Z",
                "sourceTitle": "Movie.2021-GROUP", "data": {"indexer": "nzbs"}}"#,
        )
        .unwrap();
        assert_eq!(from_name.kind(), HistoryEventKind::Grabbed);
        let event = from_name.into_event();
        assert_eq!(event.source_text.as_deref(), Some("Movie.2021-GROUP"));
        assert_eq!(event.indexer.as_deref(), Some("nzbs"));

        let from_code: HistoryRecord = serde_json::from_str(
            r#"{"eventType": 3, "date": "2022-01-02T00:00:00Z",
                "data": {"droppedPath": "/downloads/completed/movie.mkv"}}"#,
        )
        .unwrap();
        assert_eq!(from_code.kind(), HistoryEventKind::Imported);
        assert_eq!(
            from_code.into_event().source_text.as_deref(),
            Some("/downloads/completed/movie.mkv")
        );
    }
}
