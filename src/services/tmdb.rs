//! TMDB release-dates client
//!
//! Maps an IMDb-style id to a TMDB movie and pulls its per-country
//! release dates. Release types: 3 theatrical, 4 digital, 5 physical.
//! Dates are looked up in the configured country first, then the other
//! major English-language regions, then anywhere.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::provider::{ReleaseCandidate, ReleaseKind};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const ANGLOPHONE_FALLBACK: &[&str] = &["US", "GB", "CA", "AU", "NZ", "IE"];

const TYPE_THEATRICAL: u8 = 3;
const TYPE_DIGITAL: u8 = 4;
const TYPE_PHYSICAL: u8 = 5;

#[derive(Debug, Deserialize)]
struct FindResponse {
    movie_results: Vec<FindMovie>,
}

#[derive(Debug, Deserialize)]
struct FindMovie {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ReleaseDatesResponse {
    results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
struct CountryReleases {
    iso_3166_1: String,
    release_dates: Vec<ReleaseDateEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseDateEntry {
    #[serde(rename = "type")]
    release_type: u8,
    release_date: DateTime<Utc>,
}

pub struct TmdbClient {
    client: Client,
    api_key: String,
    country: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            country: country.into().to_uppercase(),
        }
    }

    async fn find_movie_id(&self, imdb_id: &str) -> Result<Option<i64>> {
        let url = format!("{BASE_URL}/find/{imdb_id}");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("external_source", "imdb_id"),
            ])
            .send()
            .await
            .context("looking up movie on TMDB")?;

        if !response.status().is_success() {
            anyhow::bail!("TMDB find returned status {}", response.status());
        }

        let found: FindResponse = response.json().await.context("parsing TMDB find response")?;
        Ok(found.movie_results.first().map(|m| m.id))
    }

    /// Release-date candidates for a movie, at most one per kind
    pub async fn release_dates(&self, imdb_id: &str) -> Result<Vec<ReleaseCandidate>> {
        let Some(movie_id) = self.find_movie_id(imdb_id).await? else {
            debug!(imdb_id, "Title unknown to TMDB");
            return Ok(Vec::new());
        };

        let url = format!("{BASE_URL}/movie/{movie_id}/release_dates");
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .context("fetching TMDB release dates")?;

        if !response.status().is_success() {
            anyhow::bail!("TMDB release dates returned status {}", response.status());
        }

        let data: ReleaseDatesResponse = response
            .json()
            .await
            .context("parsing TMDB release dates")?;

        Ok(pick_candidates(&data.results, &self.country))
    }
}

fn kind_of(release_type: u8) -> Option<ReleaseKind> {
    match release_type {
        TYPE_THEATRICAL => Some(ReleaseKind::Theatrical),
        TYPE_DIGITAL => Some(ReleaseKind::Digital),
        TYPE_PHYSICAL => Some(ReleaseKind::Physical),
        _ => None,
    }
}

fn scan_country(country: &CountryReleases, candidates: &mut Vec<ReleaseCandidate>) {
    for entry in &country.release_dates {
        let Some(kind) = kind_of(entry.release_type) else {
            continue;
        };
        if candidates.iter().any(|c| c.kind == kind) {
            continue;
        }
        candidates.push(ReleaseCandidate {
            kind,
            date: entry.release_date,
            origin: format!("tmdb {} {}", country.iso_3166_1, kind.as_str()),
        });
    }
}

/// One candidate per kind, searching the preferred country first, the
/// English-language regions next, and finally every country
fn pick_candidates(countries: &[CountryReleases], preferred: &str) -> Vec<ReleaseCandidate> {
    let mut order: Vec<&str> = vec![preferred];
    order.extend(ANGLOPHONE_FALLBACK.iter().filter(|c| **c != preferred));

    let mut candidates: Vec<ReleaseCandidate> = Vec::new();
    for code in order {
        if let Some(country) = countries.iter().find(|c| c.iso_3166_1 == code) {
            scan_country(country, &mut candidates);
        }
        if candidates.len() == 3 {
            return candidates;
        }
    }
    for country in countries {
        scan_country(country, &mut candidates);
        if candidates.len() == 3 {
            break;
        }
    }
    candidates
}
