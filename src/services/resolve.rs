//! Tiered date resolution engine
//!
//! Produces one canonical `(date, source, secondary date)` per title or
//! episode by walking a fixed tier order, short-circuiting on the first
//! trustworthy hit and never averaging between sources:
//!
//! 1. sidecar cache (our own previous write)
//! 2. durable record cache
//! 3. import history (with rename-first and grab handling)
//! 4. external release dates (with smart gap validation)
//! 5. manager-authored sidecar premiere date
//! 6. filesystem mtime (opt-in, low trust)
//! 7. terminal no-valid-date-source
//!
//! External lookup failures are logged and treated as "no candidate from
//! this tier"; `resolve` itself never fails.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::ident;
use super::provenance::{DateRecord, Provenance, ProvenanceKind};
use super::provider::{
    HistoryEvent, HistoryEventKind, ReleaseCandidate, ReleaseInfoProvider, ReleaseKind,
};
use super::sidecar::{SidecarData, SidecarStore};

/// File extensions counted as media for presence checks and the mtime tier
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "m4v"];

/// Path fragments that identify a download/staging area rather than the
/// library itself. An import event sourced from one of these is a real
/// acquisition even when the path carries no recognizable id.
const DOWNLOAD_PATH_INDICATORS: &[&str] = &[
    "/downloads/",
    "/download/",
    "/completed/",
    "/importing/",
    "sabnzbd",
    "nzbget",
    "qbittorrent",
    "transmission",
    "deluge",
];

/// Tunables for the resolution engine, derived from [`crate::config::Config`]
#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    pub release_date_priority: Vec<ReleaseKind>,
    pub enable_smart_date_validation: bool,
    pub max_release_date_gap_years: i32,
    pub prefer_release_dates_over_file_dates: bool,
    pub allow_file_date_fallback: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            release_date_priority: vec![
                ReleaseKind::Digital,
                ReleaseKind::Physical,
                ReleaseKind::Theatrical,
            ],
            enable_smart_date_validation: true,
            max_release_date_gap_years: 10,
            prefer_release_dates_over_file_dates: true,
            allow_file_date_fallback: false,
        }
    }
}

/// Per-pass inputs beyond the entity id
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveContext<'a> {
    /// Title directory on disk, for the sidecar and mtime tiers
    pub media_path: Option<&'a Path>,
    /// Sidecar file for this entity (movie.nfo or the episode NFO)
    pub sidecar_path: Option<&'a Path>,
    /// Season/episode for TV entities
    pub episode: Option<(u32, u32)>,
    /// Whether external queries are permitted this pass
    pub should_query: bool,
    /// Current durable record, if any
    pub existing: Option<&'a DateRecord>,
}

pub struct DateResolutionEngine {
    provider: Arc<dyn ReleaseInfoProvider>,
    config: ResolutionConfig,
}

impl DateResolutionEngine {
    pub fn new(provider: Arc<dyn ReleaseInfoProvider>, config: ResolutionConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the canonical date record for one entity.
    ///
    /// Infallible by contract: every failure mode collapses into a lower
    /// tier, ending at the terminal no-valid-date-source record.
    pub async fn resolve(&self, entity_id: &str, ctx: ResolveContext<'_>) -> DateRecord {
        // Tier 1: our own sidecar is the cheapest trustworthy cache
        if let Some(sidecar_path) = ctx.sidecar_path {
            if let Some(data) = SidecarStore::read(sidecar_path) {
                if let Some(record) = data.cached_record() {
                    debug!(entity_id, source = %record.source, "Tier 1: reusing sidecar cache");
                    return record;
                }
            }
        }

        // Tier 2: durable record cache. With queries disabled the stored
        // record is reused verbatim whatever it holds, so terminal states
        // stay stable; with queries enabled only query-backed records
        // short-circuit.
        if let Some(existing) = ctx.existing {
            if !ctx.should_query || existing.is_query_backed() {
                debug!(entity_id, source = %existing.source, "Tier 2: reusing durable record");
                return existing.clone();
            }
        }
        if !ctx.should_query {
            return self.resolve_without_queries(entity_id, ctx);
        }

        // Tier 3: import history
        let history = match self.provider.import_history(entity_id).await {
            Ok(events) => events,
            Err(e) => {
                warn!(entity_id, error = %e, "Import history query failed, tier skipped");
                Vec::new()
            }
        };

        let history_outcome = self.evaluate_history(entity_id, &history);
        if let HistoryOutcome::Hit(record) = history_outcome {
            return record;
        }

        // Weak fallback from the manager: its internal file-added time. Not
        // a true acquisition date, so release dates may still beat it.
        let file_added = if self.config.allow_file_date_fallback
            || self.config.prefer_release_dates_over_file_dates
        {
            match self.provider.file_added_date(entity_id).await {
                Ok(date) => date,
                Err(e) => {
                    warn!(entity_id, error = %e, "File-added date query failed");
                    None
                }
            }
        } else {
            None
        };

        // Tier 4: external release dates (air date for episodes)
        let release = if let Some((season, episode)) = ctx.episode {
            self.episode_air_date(entity_id, season, episode).await
        } else {
            self.release_date(entity_id).await
        };

        if let Some((release_record, release_kind)) = release {
            match file_added {
                Some(added) if !self.should_prefer_release(&release_record, release_kind) => {
                    info!(entity_id, "Keeping manager file-added date over implausible release date");
                    return DateRecord::new(added, Provenance::new(ProvenanceKind::FileAdded))
                        .with_secondary(release_record.secondary_date);
                }
                _ => {
                    info!(entity_id, source = %release_record.source, "Tier 4: using release date");
                    return release_record;
                }
            }
        }

        if let Some(added) = file_added {
            if self.config.allow_file_date_fallback {
                info!(entity_id, "Using manager file-added date, no release date available");
                return DateRecord::new(added, Provenance::new(ProvenanceKind::FileAdded));
            }
        }

        self.resolve_without_queries(entity_id, ctx)
    }

    /// Tiers that touch nothing but the local filesystem
    fn resolve_without_queries(&self, entity_id: &str, ctx: ResolveContext<'_>) -> DateRecord {
        // Tier 5: premiere date from a manager-authored sidecar
        if let Some(sidecar_path) = ctx.sidecar_path {
            if let Some(SidecarData {
                premiered: Some(premiered),
                managed: false,
                ..
            }) = SidecarStore::read(sidecar_path)
            {
                info!(entity_id, "Tier 5: using premiere date from manager sidecar");
                return DateRecord::new(
                    premiered,
                    Provenance::new(ProvenanceKind::SecondarySidecar),
                )
                .with_secondary(Some(premiered));
            }
        }

        // Tier 6: newest media file mtime, only when explicitly enabled
        if self.config.allow_file_date_fallback {
            if let Some(dir) = ctx.media_path {
                if let Some(mtime) = newest_video_mtime(dir) {
                    info!(entity_id, "Tier 6: using file modification time");
                    return DateRecord::new(mtime, Provenance::new(ProvenanceKind::FileMtime));
                }
            }
        }

        // Tier 7: terminal state, stable and distinguishable from
        // "not yet attempted"
        info!(entity_id, "No valid date source found");
        DateRecord::unresolved()
    }

    /// Walk the history for the earliest true import, honoring the
    /// rename-first rule and falling back to a qualified grab event.
    fn evaluate_history(&self, entity_id: &str, history: &[HistoryEvent]) -> HistoryOutcome {
        if history.is_empty() {
            return HistoryOutcome::Miss;
        }

        // A history that opens with a reorganization means the file existed
        // before the manager started tracking it; any import after that is
        // an upgrade, not the acquisition. Release dates win instead.
        if history[0].kind.is_reorganization() {
            info!(entity_id, "Rename-first history, preferring release dates over imports");
            return HistoryOutcome::RenameFirst;
        }

        for event in history {
            if event.kind == HistoryEventKind::Imported
                && import_event_matches(entity_id, event)
            {
                debug!(entity_id, date = %event.date, "Tier 3: earliest real import event");
                let mut provenance = Provenance::new(ProvenanceKind::ImportHistory);
                if let Some(text) = &event.source_text {
                    provenance.detail = Some(text.clone());
                }
                return HistoryOutcome::Hit(DateRecord::new(event.date, provenance));
            }
        }

        // No import: the first grab that carries real download metadata
        for event in history {
            if event.kind == HistoryEventKind::Grabbed
                && (event.source_text.is_some() || event.indexer.is_some())
            {
                warn!(entity_id, date = %event.date, "Tier 3: no import event, using grab date");
                return HistoryOutcome::Hit(DateRecord::new(
                    event.date,
                    Provenance::new(ProvenanceKind::GrabHistory),
                ));
            }
        }

        HistoryOutcome::Miss
    }

    /// Pick a release-date candidate by configured priority, applying the
    /// gap validation against the theatrical reference date.
    async fn release_date(&self, entity_id: &str) -> Option<(DateRecord, ReleaseKind)> {
        let candidates = match self.provider.release_dates(entity_id).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(entity_id, error = %e, "Release date query failed, tier skipped");
                return None;
            }
        };
        if candidates.is_empty() {
            return None;
        }

        let theatrical = candidates
            .iter()
            .find(|c| c.kind == ReleaseKind::Theatrical)
            .map(|c| c.date);

        let pick = |candidate: &ReleaseCandidate, note: Option<&str>| {
            let kind = match candidate.kind {
                ReleaseKind::Digital => ProvenanceKind::DigitalRelease,
                ReleaseKind::Physical => ProvenanceKind::PhysicalRelease,
                ReleaseKind::Theatrical => ProvenanceKind::TheatricalRelease,
            };
            let detail = match note {
                Some(note) => format!("{} {}", candidate.origin, note),
                None => candidate.origin.clone(),
            };
            (
                DateRecord::new(candidate.date, Provenance::with_detail(kind, detail))
                    .with_secondary(theatrical.or(Some(candidate.date))),
                candidate.kind,
            )
        };

        if self.config.enable_smart_date_validation && candidates.len() > 1 {
            if let Some(theatrical_date) = theatrical {
                for priority in &self.config.release_date_priority {
                    if *priority == ReleaseKind::Theatrical {
                        continue;
                    }
                    let Some(candidate) = candidates.iter().find(|c| c.kind == *priority) else {
                        continue;
                    };
                    let gap_years =
                        (candidate.date - theatrical_date).num_days() as f64 / 365.25;
                    if gap_years > self.config.max_release_date_gap_years as f64 {
                        info!(
                            entity_id,
                            kind = candidate.kind.as_str(),
                            gap_years,
                            "Release date implausibly late after theatrical, rejected"
                        );
                        continue;
                    }
                    return Some(pick(candidate, Some("(validated)")));
                }
                // Every non-theatrical candidate failed validation
                let candidate = candidates.iter().find(|c| c.kind == ReleaseKind::Theatrical)?;
                return Some(pick(candidate, Some("(smart fallback)")));
            }
        }

        for priority in &self.config.release_date_priority {
            if let Some(candidate) = candidates.iter().find(|c| c.kind == *priority) {
                return Some(pick(candidate, None));
            }
        }
        None
    }

    async fn episode_air_date(
        &self,
        entity_id: &str,
        season: u32,
        episode: u32,
    ) -> Option<(DateRecord, ReleaseKind)> {
        match self.provider.episode_air_date(entity_id, season, episode).await {
            Ok(Some(date)) => {
                let record = DateRecord::new(
                    date,
                    Provenance::with_detail(
                        ProvenanceKind::AirDate,
                        format!("S{season:02}E{episode:02}"),
                    ),
                )
                .with_secondary(Some(date));
                Some((record, ReleaseKind::Digital))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(entity_id, season, episode, error = %e, "Air date query failed");
                None
            }
        }
    }

    /// Decide whether a release date should beat the manager's weak
    /// file-added timestamp. Theatrical and physical dates always win;
    /// digital dates win unless implausibly early relative to the
    /// theatrical date or absurdly old outright.
    fn should_prefer_release(&self, release: &DateRecord, kind: ReleaseKind) -> bool {
        if !self.config.prefer_release_dates_over_file_dates {
            return false;
        }
        if matches!(kind, ReleaseKind::Theatrical | ReleaseKind::Physical) {
            return true;
        }
        let Some(date) = release.date else { return false };
        if let Some(theatrical) = release.secondary_date {
            let years_before = (theatrical - date).num_days() as f64 / 365.25;
            if years_before > self.config.max_release_date_gap_years as f64 {
                return false;
            }
        }
        // digital releases predating the format are data errors
        date.year() >= 1990
    }
}

enum HistoryOutcome {
    Hit(DateRecord),
    RenameFirst,
    Miss,
}

/// Accept an import event as a true acquisition. Events without a source
/// path are trusted (the manager already scoped the history to this title);
/// otherwise the path must carry the entity id or come from a download
/// area. The matching here is heuristic and the indicator list is the
/// tunable part.
fn import_event_matches(entity_id: &str, event: &HistoryEvent) -> bool {
    let Some(text) = &event.source_text else {
        return true;
    };
    if let Some(found) = ident::extract_id_from_text(text) {
        return ident::ids_match(&found, entity_id);
    }
    let lower = text.to_lowercase();
    DOWNLOAD_PATH_INDICATORS.iter().any(|hint| lower.contains(hint))
}

/// Newest modification time among the media files under `dir`
pub fn newest_video_mtime(dir: &Path) -> Option<DateTime<Utc>> {
    let mut newest: Option<DateTime<Utc>> = None;
    for entry in WalkDir::new(dir).max_depth(2).into_iter().flatten() {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_video = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);
        if !is_video {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let Ok(mtime) = meta.modified() else { continue };
        let dt: DateTime<Utc> = mtime.into();
        if newest.map(|n| dt > n).unwrap_or(true) {
            newest = Some(dt);
        }
    }
    newest
}

/// True when `dir` holds at least one media file
pub fn has_video_files(dir: &Path) -> bool {
    newest_video_mtime(dir).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use parking_lot::Mutex;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    /// Scriptable provider that also counts queries
    #[derive(Default)]
    struct StubProvider {
        history: Vec<HistoryEvent>,
        releases: Vec<ReleaseCandidate>,
        file_added: Option<DateTime<Utc>>,
        air_date: Option<DateTime<Utc>>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ReleaseInfoProvider for StubProvider {
        async fn import_history(&self, _id: &str) -> anyhow::Result<Vec<HistoryEvent>> {
            *self.calls.lock() += 1;
            Ok(self.history.clone())
        }

        async fn release_dates(&self, _id: &str) -> anyhow::Result<Vec<ReleaseCandidate>> {
            *self.calls.lock() += 1;
            Ok(self.releases.clone())
        }

        async fn file_added_date(&self, _id: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
            *self.calls.lock() += 1;
            Ok(self.file_added)
        }

        async fn episode_air_date(
            &self,
            _id: &str,
            _season: u32,
            _episode: u32,
        ) -> anyhow::Result<Option<DateTime<Utc>>> {
            *self.calls.lock() += 1;
            Ok(self.air_date)
        }
    }

    fn engine(provider: StubProvider) -> DateResolutionEngine {
        DateResolutionEngine::new(Arc::new(provider), ResolutionConfig::default())
    }

    fn import_event(d: DateTime<Utc>) -> HistoryEvent {
        HistoryEvent {
            kind: HistoryEventKind::Imported,
            date: d,
            source_text: Some("/downloads/completed/movie".into()),
            indexer: None,
        }
    }

    fn rename_event(d: DateTime<Utc>) -> HistoryEvent {
        HistoryEvent {
            kind: HistoryEventKind::Renamed,
            date: d,
            source_text: None,
            indexer: None,
        }
    }

    fn digital(d: DateTime<Utc>) -> ReleaseCandidate {
        ReleaseCandidate {
            kind: ReleaseKind::Digital,
            date: d,
            origin: "tmdb US".into(),
        }
    }

    fn theatrical(d: DateTime<Utc>) -> ReleaseCandidate {
        ReleaseCandidate {
            kind: ReleaseKind::Theatrical,
            date: d,
            origin: "tmdb US".into(),
        }
    }

    #[tokio::test]
    async fn test_import_history_beats_release_dates() {
        let provider = StubProvider {
            history: vec![import_event(date(2022, 3, 1))],
            releases: vec![digital(date(2022, 1, 1)), theatrical(date(2021, 6, 1))],
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000001", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::ImportHistory);
        assert_eq!(record.date, Some(date(2022, 3, 1)));
    }

    #[tokio::test]
    async fn test_rename_first_prefers_release_dates() {
        // Import exists later in history, but the rename opener marks it
        // as upgrade noise.
        let provider = StubProvider {
            history: vec![rename_event(date(2023, 1, 1)), import_event(date(2023, 2, 1))],
            releases: vec![digital(date(2021, 9, 1)), theatrical(date(2021, 6, 1))],
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000002", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::DigitalRelease);
        assert_eq!(record.date, Some(date(2021, 9, 1)));
        assert_eq!(record.secondary_date, Some(date(2021, 6, 1)));
    }

    #[tokio::test]
    async fn test_smart_validation_rejects_late_digital() {
        // Digital date more than ten years after theatrical is a data
        // error; the engine must fall back to the theatrical date.
        let provider = StubProvider {
            releases: vec![digital(date(2031, 6, 1)), theatrical(date(2020, 1, 1))],
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000003", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::TheatricalRelease);
        assert_eq!(record.date, Some(date(2020, 1, 1)));
    }

    #[tokio::test]
    async fn test_smart_validation_accepts_reasonable_digital() {
        let provider = StubProvider {
            releases: vec![digital(date(2020, 4, 1)), theatrical(date(2020, 1, 1))],
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000004", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::DigitalRelease);
        assert_eq!(record.date, Some(date(2020, 4, 1)));
    }

    #[tokio::test]
    async fn test_cached_record_reused_without_queries() {
        let provider = StubProvider {
            history: vec![import_event(date(2022, 3, 1))],
            ..Default::default()
        };
        let engine = engine(provider);

        let existing = DateRecord::new(
            date(2019, 5, 5),
            Provenance::new(ProvenanceKind::DigitalRelease),
        );
        let ctx = ResolveContext {
            should_query: false,
            existing: Some(&existing),
            ..Default::default()
        };
        let record = engine.resolve("tt0000005", ctx).await;
        assert_eq!(record, existing);
    }

    #[tokio::test]
    async fn test_query_backed_record_short_circuits_queries() {
        let provider = StubProvider {
            history: vec![import_event(date(2022, 3, 1))],
            ..Default::default()
        };
        let engine = DateResolutionEngine::new(
            Arc::new(provider),
            ResolutionConfig::default(),
        );

        let existing = DateRecord::new(
            date(2019, 5, 5),
            Provenance::new(ProvenanceKind::ImportHistory),
        );
        let ctx = ResolveContext {
            should_query: true,
            existing: Some(&existing),
            ..Default::default()
        };
        let record = engine.resolve("tt0000006", ctx).await;
        assert_eq!(record, existing);
    }

    #[tokio::test]
    async fn test_terminal_state_is_stable() {
        let engine = engine(StubProvider::default());

        let terminal = DateRecord::unresolved();
        let ctx = ResolveContext {
            should_query: false,
            existing: Some(&terminal),
            ..Default::default()
        };
        let record = engine.resolve("tt0000007", ctx).await;
        assert_eq!(record, terminal);

        // With queries enabled and still no candidates, the terminal state
        // is re-derived, not turned into an error.
        let ctx = ResolveContext {
            should_query: true,
            existing: Some(&terminal),
            ..Default::default()
        };
        let record = engine.resolve("tt0000007", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::NoValidDateSource);
        assert_eq!(record.date, None);
    }

    #[tokio::test]
    async fn test_grab_event_used_when_no_import() {
        let provider = StubProvider {
            history: vec![HistoryEvent {
                kind: HistoryEventKind::Grabbed,
                date: date(2022, 2, 2),
                source_text: Some("Movie.2021.1080p-GROUP".into()),
                indexer: Some("nzbs".into()),
            }],
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000008", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::GrabHistory);
    }

    #[tokio::test]
    async fn test_weak_file_added_kept_over_implausibly_early_digital() {
        // Digital date decades before theatrical signals bad data; the
        // weak file-added timestamp wins the tie-break.
        let provider = StubProvider {
            file_added: Some(date(2023, 8, 1)),
            releases: vec![digital(date(1995, 1, 1)), theatrical(date(2020, 1, 1))],
            ..Default::default()
        };
        let mut config = ResolutionConfig::default();
        config.allow_file_date_fallback = true;
        // validation would reject nothing here: digital is before
        // theatrical, which only the tie-break checks
        config.enable_smart_date_validation = false;
        let engine = DateResolutionEngine::new(Arc::new(provider), config);

        let ctx = ResolveContext {
            should_query: true,
            ..Default::default()
        };
        let record = engine.resolve("tt0000009", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::FileAdded);
        assert_eq!(record.date, Some(date(2023, 8, 1)));
    }

    #[tokio::test]
    async fn test_episode_air_date_used_for_tv() {
        let provider = StubProvider {
            air_date: Some(date(2021, 10, 3)),
            ..Default::default()
        };
        let engine = engine(provider);

        let ctx = ResolveContext {
            should_query: true,
            episode: Some((2, 7)),
            ..Default::default()
        };
        let record = engine.resolve("tt0000010", ctx).await;
        assert_eq!(record.source.kind, ProvenanceKind::AirDate);
        assert_eq!(record.source.detail.as_deref(), Some("S02E07"));
    }

    #[test]
    fn test_import_event_match_heuristics() {
        let event = |text: Option<&str>| HistoryEvent {
            kind: HistoryEventKind::Imported,
            date: date(2022, 1, 1),
            source_text: text.map(String::from),
            indexer: None,
        };

        // no path: manager scoped the history, trust it
        assert!(import_event_matches("tt0113277", &event(None)));
        // id embedded in path
        assert!(import_event_matches(
            "tt0113277",
            &event(Some("/library/Heat (1995) [imdb-tt0113277]/file.mkv"))
        ));
        // wrong id in path
        assert!(!import_event_matches(
            "tt0113277",
            &event(Some("/library/Other (2001) [imdb-tt0133093]/file.mkv"))
        ));
        // no id but clearly a download area
        assert!(import_event_matches(
            "tt0113277",
            &event(Some("/downloads/completed/heat.1995.mkv"))
        ));
        // no id, not a download area
        assert!(!import_event_matches(
            "tt0113277",
            &event(Some("/library/Heat (1995)/heat.mkv"))
        ));
    }
}
