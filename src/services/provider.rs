//! Release-info provider seam
//!
//! The resolution engine talks to the outside world (manager history APIs,
//! release-date databases) through this trait, so the tiered algorithm can
//! be exercised against synthetic providers in tests. "No data" is an
//! ordinary empty/None result; `Err` is reserved for genuine I/O failures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History event categories from the managers, mapped from their numeric
/// event-type codes (1 grabbed, 3 imported, 4 failed, 6 retagged,
/// 7/8 renamed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEventKind {
    Grabbed,
    Imported,
    Failed,
    Retagged,
    Renamed,
    Other,
}

impl HistoryEventKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Grabbed,
            3 => Self::Imported,
            4 => Self::Failed,
            6 => Self::Retagged,
            7 | 8 => Self::Renamed,
            _ => Self::Other,
        }
    }

    /// Rename/retag events reorganize files that already existed; a history
    /// that opens with one marks the title as pre-existing content.
    pub fn is_reorganization(&self) -> bool {
        matches!(self, Self::Renamed | Self::Retagged)
    }
}

/// One event from a manager's history, oldest-first when returned in a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,
    pub date: DateTime<Utc>,
    /// Source path or release title attached to the event, when present
    pub source_text: Option<String>,
    /// Indexer name for grab events, when present
    pub indexer: Option<String>,
}

/// Release-date category from external sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Digital,
    Physical,
    Theatrical,
}

impl ReleaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Physical => "physical",
            Self::Theatrical => "theatrical",
        }
    }

    pub fn from_priority_name(name: &str) -> Option<Self> {
        match name {
            "digital" => Some(Self::Digital),
            "physical" => Some(Self::Physical),
            "theatrical" => Some(Self::Theatrical),
            _ => None,
        }
    }
}

/// A dated release candidate with its origin for the audit note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseCandidate {
    pub kind: ReleaseKind,
    pub date: DateTime<Utc>,
    pub origin: String,
}

/// External lookups the resolution engine depends on
#[async_trait]
pub trait ReleaseInfoProvider: Send + Sync {
    /// Full event history for a title, oldest first. Empty when the manager
    /// does not know the title.
    async fn import_history(&self, entity_id: &str) -> anyhow::Result<Vec<HistoryEvent>>;

    /// Release-date candidates from external databases, at most one per kind
    async fn release_dates(&self, entity_id: &str) -> anyhow::Result<Vec<ReleaseCandidate>>;

    /// The manager's own internal file-added timestamp (weak fallback, not
    /// a true acquisition date)
    async fn file_added_date(&self, entity_id: &str) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Air/premiere date for a TV episode
    async fn episode_air_date(
        &self,
        entity_id: &str,
        season: u32,
        episode: u32,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;
}
