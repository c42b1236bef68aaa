//! Integration tests for the date resolution pipeline
//!
//! These tests verify the rules the pipeline must obey end to end:
//! - Tier ordering and short-circuiting
//! - Webhook debounce and coalescing semantics
//! - Provenance tag stability
//! - Smart release-date validation

// ============================================================================
// Tier Ordering Tests
// ============================================================================

/// Resolution tiers in priority order
const TIER_ORDER: &[&str] = &[
    "sidecar-cache",
    "durable-cache",
    "import-history",
    "release-dates",
    "secondary-sidecar",
    "file-mtime",
    "no-valid-date-source",
];

mod tier_ordering {
    use super::*;

    fn tier_rank(tier: &str) -> Option<usize> {
        TIER_ORDER.iter().position(|t| *t == tier)
    }

    /// The first tier that yields a date wins; nothing below it runs
    fn resolve(available: &[&str]) -> &'static str {
        for tier in TIER_ORDER {
            if available.contains(tier) {
                return tier;
            }
        }
        "no-valid-date-source"
    }

    #[test]
    fn test_cache_tiers_beat_queries() {
        assert_eq!(
            resolve(&["sidecar-cache", "import-history", "release-dates"]),
            "sidecar-cache"
        );
        assert_eq!(
            resolve(&["durable-cache", "import-history"]),
            "durable-cache"
        );
        assert!(tier_rank("sidecar-cache") < tier_rank("durable-cache"));
    }

    #[test]
    fn test_import_history_beats_release_dates() {
        assert_eq!(
            resolve(&["import-history", "release-dates"]),
            "import-history"
        );
    }

    #[test]
    fn test_terminal_state_when_nothing_available() {
        assert_eq!(resolve(&[]), "no-valid-date-source");
    }

    #[test]
    fn test_file_mtime_is_last_real_tier() {
        assert_eq!(
            tier_rank("file-mtime").unwrap(),
            TIER_ORDER.len() - 2,
            "only the terminal state may rank below the mtime tier"
        );
    }
}

// ============================================================================
// Debounce / Coalescing Tests
// ============================================================================

mod debounce_rules {
    use std::collections::HashMap;

    /// Simulated batcher queue: (key, payload, arrival_time)
    struct Queue {
        pending: HashMap<String, (String, u64)>,
        delay: u64,
    }

    impl Queue {
        fn new(delay: u64) -> Self {
            Self {
                pending: HashMap::new(),
                delay,
            }
        }

        /// Last write wins and the window restarts
        fn submit(&mut self, key: &str, payload: &str, now: u64) {
            self.pending.insert(key.to_string(), (payload.to_string(), now));
        }

        /// Entries whose window has elapsed fire; the rest stay queued
        fn due(&self, now: u64) -> Vec<(String, String)> {
            self.pending
                .iter()
                .filter(|(_, (_, at))| now >= at + self.delay)
                .map(|(k, (p, _))| (k.clone(), p.clone()))
                .collect()
        }
    }

    #[test]
    fn test_burst_collapses_to_latest() {
        let mut q = Queue::new(5);
        q.submit("movie:tt0113277", "Grab", 0);
        q.submit("movie:tt0113277", "Download", 1);
        q.submit("movie:tt0113277", "Upgrade", 2);

        // window restarted at t=2, so nothing is due at t=6
        assert!(q.due(6).is_empty());

        let due = q.due(7);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].1, "Upgrade");
    }

    #[test]
    fn test_keys_are_independent() {
        let mut q = Queue::new(5);
        q.submit("movie:tt0000001", "Download", 0);
        q.submit("movie:tt0000002", "Download", 3);

        // first key's window was not restarted by the second key
        let due = q.due(5);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, "movie:tt0000001");
    }

    #[test]
    fn test_movie_and_series_keys_never_collide() {
        let movie_key = format!("movie:{}", "tt0113277");
        let tv_key = format!("tv:{}", "tt0113277");
        assert_ne!(movie_key, tv_key);
    }
}

// ============================================================================
// Provenance Tag Tests
// ============================================================================

mod provenance_strings {
    /// Stable origin:method strings persisted in the database and sidecars
    const KNOWN_SOURCES: &[&str] = &[
        "import-history:import",
        "import-history:grab",
        "release:digital",
        "release:physical",
        "release:theatrical",
        "release:air-date",
        "sidecar:premiered",
        "manager:file-added",
        "file:mtime",
        "webhook:fallback-timestamp",
        "manual:operator",
        "no-valid-date-source",
    ];

    /// Sources a later pass may reuse without querying anything
    fn is_query_backed(source: &str) -> bool {
        !matches!(
            source,
            "no-valid-date-source"
                | "webhook:fallback-timestamp"
                | "file:mtime"
                | "manager:file-added"
        )
    }

    #[test]
    fn test_all_sources_follow_origin_method_shape() {
        for source in KNOWN_SOURCES {
            if *source == "no-valid-date-source" {
                continue;
            }
            let parts: Vec<&str> = source.splitn(2, ':').collect();
            assert_eq!(parts.len(), 2, "{source} must be origin:method");
            assert!(!parts[0].is_empty() && !parts[1].is_empty());
        }
    }

    #[test]
    fn test_weak_sources_are_retried_on_later_passes() {
        assert!(!is_query_backed("webhook:fallback-timestamp"));
        assert!(!is_query_backed("file:mtime"));
        assert!(!is_query_backed("no-valid-date-source"));
        assert!(is_query_backed("import-history:import"));
        assert!(is_query_backed("release:digital"));
    }

    #[test]
    fn test_no_duplicate_sources() {
        let mut sorted = KNOWN_SOURCES.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), KNOWN_SOURCES.len());
    }
}

// ============================================================================
// Smart Validation Tests
// ============================================================================

mod smart_validation {
    const MAX_GAP_YEARS: f64 = 10.0;

    /// Accept a non-theatrical release date only when it lands within the
    /// plausible window after the theatrical date
    fn accept_candidate(candidate_year: f64, theatrical_year: f64) -> bool {
        candidate_year - theatrical_year <= MAX_GAP_YEARS
    }

    /// Digital dates far before the theatrical date, or predating digital
    /// distribution entirely, are data errors
    fn digital_is_plausible(digital_year: f64, theatrical_year: f64) -> bool {
        theatrical_year - digital_year <= MAX_GAP_YEARS && digital_year >= 1990.0
    }

    #[test]
    fn test_late_digital_rejected() {
        assert!(!accept_candidate(2031.5, 2020.0));
        assert!(accept_candidate(2020.3, 2020.0));
        // exactly at the boundary is still plausible
        assert!(accept_candidate(2030.0, 2020.0));
    }

    #[test]
    fn test_implausibly_early_digital_rejected() {
        assert!(!digital_is_plausible(1995.0, 2020.0));
        assert!(!digital_is_plausible(1985.0, 1986.0));
        assert!(digital_is_plausible(2019.5, 2020.0));
    }

    #[test]
    fn test_validation_failure_falls_back_to_theatrical() {
        // when every non-theatrical candidate fails, the theatrical date
        // itself is used rather than dropping to a lower tier
        let candidates = [("digital", 2035.0), ("physical", 2036.0)];
        let theatrical = 2020.0;
        let chosen = candidates
            .iter()
            .find(|(_, year)| accept_candidate(*year, theatrical))
            .map(|(kind, _)| *kind)
            .unwrap_or("theatrical");
        assert_eq!(chosen, "theatrical");
    }
}
