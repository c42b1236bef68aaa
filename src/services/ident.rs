//! Entity identifier extraction
//!
//! Derives the stable content id (IMDb-style `tt1234567`, or a
//! provider-qualified fallback such as `tmdb-12345`) from directory names,
//! filenames, and sidecar metadata content, plus season/episode numbers
//! from episode filenames like:
//! - "Chicago Fire S14E08 1080p WEB h264-ETHEL"
//! - "Corner Gas 6x12 Super Sensitive.mkv"
//! - "Show Season 1 Episode 5.mkv"

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which manager a title belongs to. Entity keys are namespaced by kind so
/// a movie and a series sharing an external id can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
        }
    }

    /// Batch key for an entity id, e.g. `movie:tt1234567`
    pub fn entity_key(&self, id: &str) -> String {
        format!("{}:{}", self.as_str(), id)
    }
}

static ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[imdb-?(tt\d+)\]",   // [imdb-tt1234567]
        r"\[(tt\d+)\]",         // [tt1234567]
        r"\{imdb-?(tt\d+)\}",   // {imdb-tt1234567}
        r"\(imdb-?(tt\d+)\)",   // (imdb-tt1234567)
        r"[-_\s](tt\d+)$",      // trailing tt1234567
        r"imdb[_-]?(tt\d+)",    // imdb_tt1234567
        r"\[(tmdb-\d+)\]",      // [tmdb-12345] provider-qualified fallback
        r"\{(tmdb-\d+)\}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid id pattern"))
    .collect()
});

static EPISODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[sS](\d{1,2})\.?[eE](\d{1,3})",
        r"(?:^|[^\d])(\d{1,2})x(\d{1,3})(?:[^\d]|$)",
        r"(?i)Season[_\s]?(\d{1,2})[_\s]?Episode[_\s]?(\d{1,3})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid episode pattern"))
    .collect()
});

static SIDECAR_ID_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:imdb|imdbid|uniqueid[^>]*|id)>\s*(tt\d+)\s*</").unwrap()
});

fn valid_id(id: &str) -> bool {
    if let Some(digits) = id.strip_prefix("tt") {
        return (6..=9).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    }
    id.starts_with("tmdb-")
        && !id[5..].is_empty()
        && id[5..].chars().all(|c| c.is_ascii_digit())
}

/// Extract a content id from free text (a directory name, filename, or a
/// path fragment pulled from a manager's history event)
pub fn extract_id_from_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    for pattern in ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lower) {
            let id = caps.get(1).map(|m| m.as_str().to_string())?;
            if valid_id(&id) {
                return Some(id);
            }
        }
    }
    None
}

/// Extract `(season, episode)` from an episode filename
pub fn extract_episode_numbers(filename: &str) -> Option<(u32, u32)> {
    for pattern in EPISODE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(filename) {
            let season: u32 = caps.get(1)?.as_str().parse().ok()?;
            let episode: u32 = caps.get(2)?.as_str().parse().ok()?;
            if season <= 99 && (1..=999).contains(&episode) {
                return Some((season, episode));
            }
        }
    }
    None
}

/// Extract a content id from sidecar XML content.
///
/// Malformed XML is not an error here: id-bearing tags are matched
/// leniently, and a file that yields nothing simply means "no id found".
pub fn extract_id_from_sidecar_content(content: &str) -> Option<String> {
    for caps in SIDECAR_ID_TAG.captures_iter(content) {
        if let Some(m) = caps.get(1) {
            let id = m.as_str().to_lowercase();
            if valid_id(&id) {
                return Some(id);
            }
        }
    }
    // Ids sometimes only appear in plot text or foreign tags
    extract_id_from_text(content)
}

/// Names of sidecar files consulted when the path itself carries no id
const SIDECAR_NAMES: &[&str] = &["movie.nfo", "tvshow.nfo"];

/// Derive the content id for a title directory.
///
/// Priority order: directory name, then media filenames, then sidecar
/// content. The first positive match wins.
pub fn find_id_for_path(dir: &Path) -> Option<String> {
    if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
        if let Some(id) = extract_id_from_text(name) {
            return Some(id);
        }
    }

    let entries: Vec<_> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .collect();

    for entry in &entries {
        if let Some(name) = entry.file_name().to_str() {
            if let Some(id) = extract_id_from_text(name) {
                return Some(id);
            }
        }
    }

    for entry in &entries {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if SIDECAR_NAMES.contains(&name) || name.ends_with(".nfo") {
            if let Ok(content) = fs::read_to_string(entry.path()) {
                if let Some(id) = extract_id_from_sidecar_content(&content) {
                    debug!(path = %entry.path().display(), id = %id, "Found id in sidecar");
                    return Some(id);
                }
            }
        }
    }

    None
}

/// Compare two content ids, tolerating a missing `tt` prefix on either side
pub fn ids_match(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.trim_start_matches("tt").to_lowercase();
    a.eq_ignore_ascii_case(b) || strip(a) == strip(b)
}
