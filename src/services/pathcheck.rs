//! Library path validation
//!
//! A webhook names both a content id and a folder path; writing metadata
//! into the wrong directory corrupts a title permanently, so every pass
//! re-derives the id from the path and aborts on any disagreement. All
//! checks run against the configured library roots.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::ident;

/// Why a processing pass refused to touch a path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("path {0} is outside the configured library roots")]
    OutsideLibrary(PathBuf),

    #[error("path {0} does not exist")]
    Missing(PathBuf),

    #[error("no content id derivable from {0}")]
    NoIdInPath(PathBuf),

    #[error("id mismatch: webhook says {expected}, path {path} says {found}")]
    IdMismatch {
        expected: String,
        found: String,
        path: PathBuf,
    },
}

pub struct PathValidator {
    movie_roots: Vec<PathBuf>,
    tv_roots: Vec<PathBuf>,
}

impl PathValidator {
    pub fn new(movie_roots: Vec<PathBuf>, tv_roots: Vec<PathBuf>) -> Self {
        Self {
            movie_roots,
            tv_roots,
        }
    }

    fn roots(&self, kind: ident::MediaKind) -> &[PathBuf] {
        match kind {
            ident::MediaKind::Movie => &self.movie_roots,
            ident::MediaKind::Tv => &self.tv_roots,
        }
    }

    /// True when `path` sits under a configured root for `kind`. An empty
    /// root list accepts any path, for setups that mount one big library.
    pub fn within_library(&self, kind: ident::MediaKind, path: &Path) -> bool {
        let roots = self.roots(kind);
        roots.is_empty() || roots.iter().any(|root| path.starts_with(root))
    }

    /// Full pre-write check: the path must exist under a library root and
    /// the id derived from it must agree with the webhook's id.
    pub fn validate(
        &self,
        kind: ident::MediaKind,
        expected_id: &str,
        path: &Path,
    ) -> Result<(), RejectReason> {
        if !self.within_library(kind, path) {
            return Err(RejectReason::OutsideLibrary(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(RejectReason::Missing(path.to_path_buf()));
        }

        match ident::find_id_for_path(path) {
            Some(found) if ident::ids_match(&found, expected_id) => {
                debug!(path = %path.display(), id = expected_id, "Path validated");
                Ok(())
            }
            Some(found) => {
                warn!(
                    path = %path.display(),
                    expected = expected_id,
                    found = %found,
                    "Path carries a different id, refusing to write"
                );
                Err(RejectReason::IdMismatch {
                    expected: expected_id.to_string(),
                    found,
                    path: path.to_path_buf(),
                })
            }
            None => Err(RejectReason::NoIdInPath(path.to_path_buf())),
        }
    }

    /// Locate the title directory for an id by scanning the library roots.
    /// Used when a webhook arrives without a folder path.
    pub fn find_title_dir(&self, kind: ident::MediaKind, id: &str) -> Option<PathBuf> {
        for root in self.roots(kind) {
            let Ok(entries) = std::fs::read_dir(root) else { continue };
            for entry in entries.flatten() {
                if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if let Some(found) = ident::extract_id_from_text(name) {
                    if ident::ids_match(&found, id) {
                        return Some(entry.path());
                    }
                }
            }
        }
        None
    }
}
