//! Provenance tagging for resolved dates
//!
//! Every canonical date carries a tag recording which tier and method
//! produced it. The tag is an enum so downstream logic can branch on the
//! category instead of substring-matching strings; the string form
//! (`origin:method`) is what lands in the database and sidecar files.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of the source that produced a resolved date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProvenanceKind {
    /// True import event from the manager's history
    ImportHistory,
    /// Grabbed-from-indexer event used when no import event exists
    GrabHistory,
    /// Digital release date from an external source
    DigitalRelease,
    /// Physical (disc) release date from an external source
    PhysicalRelease,
    /// Theatrical release date from an external source
    TheatricalRelease,
    /// Episode air date from an external source
    AirDate,
    /// Premiere/release date read from a manager-authored sidecar
    SecondarySidecar,
    /// Manager's internal file-added timestamp (weak fallback)
    FileAdded,
    /// Newest media file modification time (low trust, opt-in)
    FileMtime,
    /// Current-time stamp applied when a webhook pass exhausts all tiers
    WebhookFallback,
    /// Operator-assigned date
    Manual,
    /// Terminal state: every tier failed
    NoValidDateSource,
}

impl ProvenanceKind {
    /// Stable `origin:method` string used in the database and sidecars
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportHistory => "import-history:import",
            Self::GrabHistory => "import-history:grab",
            Self::DigitalRelease => "release:digital",
            Self::PhysicalRelease => "release:physical",
            Self::TheatricalRelease => "release:theatrical",
            Self::AirDate => "release:air-date",
            Self::SecondarySidecar => "sidecar:premiered",
            Self::FileAdded => "manager:file-added",
            Self::FileMtime => "file:mtime",
            Self::WebhookFallback => "webhook:fallback-timestamp",
            Self::Manual => "manual:operator",
            Self::NoValidDateSource => "no-valid-date-source",
        }
    }

    /// True for sources that came out of an actual lookup, as opposed to
    /// placeholders and weak last-resort stamps. Query-backed records are
    /// reused verbatim on later passes.
    pub fn is_query_backed(&self) -> bool {
        !matches!(
            self,
            Self::NoValidDateSource | Self::WebhookFallback | Self::FileMtime | Self::FileAdded
        )
    }

    /// Release-date tier categories
    pub fn is_release_date(&self) -> bool {
        matches!(
            self,
            Self::DigitalRelease | Self::PhysicalRelease | Self::TheatricalRelease | Self::AirDate
        )
    }
}

impl fmt::Display for ProvenanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvenanceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "import-history:import" => Ok(Self::ImportHistory),
            "import-history:grab" => Ok(Self::GrabHistory),
            "release:digital" => Ok(Self::DigitalRelease),
            "release:physical" => Ok(Self::PhysicalRelease),
            "release:theatrical" => Ok(Self::TheatricalRelease),
            "release:air-date" => Ok(Self::AirDate),
            "sidecar:premiered" => Ok(Self::SecondarySidecar),
            "manager:file-added" => Ok(Self::FileAdded),
            "file:mtime" => Ok(Self::FileMtime),
            "webhook:fallback-timestamp" => Ok(Self::WebhookFallback),
            "manual:operator" => Ok(Self::Manual),
            "no-valid-date-source" => Ok(Self::NoValidDateSource),
            _ => Err(()),
        }
    }
}

/// Provenance tag: category plus an optional free-text audit note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub kind: ProvenanceKind,
    pub detail: Option<String>,
}

impl Provenance {
    pub fn new(kind: ProvenanceKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ProvenanceKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Parse the stored string form. Unknown strings are preserved as the
    /// detail of a terminal tag rather than dropped, so old rows written by
    /// earlier versions still round-trip.
    pub fn parse(s: &str) -> Self {
        if let Some((kind_str, detail)) = s.split_once(' ') {
            if let Ok(kind) = ProvenanceKind::from_str(kind_str) {
                return Self::with_detail(kind, detail.trim_start_matches('(').trim_end_matches(')'));
            }
        }
        match ProvenanceKind::from_str(s) {
            Ok(kind) => Self::new(kind),
            Err(()) => Self::with_detail(ProvenanceKind::NoValidDateSource, s),
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.kind, detail),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// The canonical resolution for one title or episode.
///
/// Exactly one of these is current per entity at any time. `date` is null
/// only in the terminal no-valid-date-source state; `secondary_date` holds
/// the reference release/air date when one is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRecord {
    pub date: Option<DateTime<Utc>>,
    pub source: Provenance,
    pub secondary_date: Option<DateTime<Utc>>,
}

impl DateRecord {
    pub fn new(date: DateTime<Utc>, source: Provenance) -> Self {
        Self {
            date: Some(date),
            source,
            secondary_date: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Option<DateTime<Utc>>) -> Self {
        self.secondary_date = secondary;
        self
    }

    /// Terminal state when every tier failed. Valid and stable, not an error.
    pub fn unresolved() -> Self {
        Self {
            date: None,
            source: Provenance::new(ProvenanceKind::NoValidDateSource),
            secondary_date: None,
        }
    }

    /// A record that a later pass with `should_query = false` must reuse
    /// verbatim rather than re-derive.
    pub fn is_query_backed(&self) -> bool {
        self.date.is_some() && self.source.kind.is_query_backed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_kind_string_round_trip() {
        let kinds = [
            ProvenanceKind::ImportHistory,
            ProvenanceKind::GrabHistory,
            ProvenanceKind::DigitalRelease,
            ProvenanceKind::PhysicalRelease,
            ProvenanceKind::TheatricalRelease,
            ProvenanceKind::AirDate,
            ProvenanceKind::SecondarySidecar,
            ProvenanceKind::FileAdded,
            ProvenanceKind::FileMtime,
            ProvenanceKind::WebhookFallback,
            ProvenanceKind::Manual,
            ProvenanceKind::NoValidDateSource,
        ];
        for kind in kinds {
            assert_eq!(ProvenanceKind::from_str(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn test_parse_with_detail() {
        let p = Provenance::parse("release:digital (tmdb US)");
        assert_eq!(p.kind, ProvenanceKind::DigitalRelease);
        assert_eq!(p.detail.as_deref(), Some("tmdb US"));
    }

    #[test]
    fn test_parse_unknown_preserved() {
        let p = Provenance::parse("radarr:db.history.import");
        assert_eq!(p.kind, ProvenanceKind::NoValidDateSource);
        assert_eq!(p.detail.as_deref(), Some("radarr:db.history.import"));
    }

    #[test]
    fn test_query_backed() {
        let date = Utc.with_ymd_and_hms(2021, 3, 14, 9, 26, 53).unwrap();
        let backed = DateRecord::new(date, Provenance::new(ProvenanceKind::ImportHistory));
        assert!(backed.is_query_backed());

        let weak = DateRecord::new(date, Provenance::new(ProvenanceKind::FileMtime));
        assert!(!weak.is_query_backed());

        assert!(!DateRecord::unresolved().is_query_backed());
    }
}
