//! Attribution requests for one host session.
//!
//! A [`Session`] owns the result cache and the history client for as long
//! as the host keeps it. Each request runs synchronously through
//!
//! ```text
//! size check → repository check → cache lookup
//!   hit  → done
//!   miss → materialize working copy if dirty → blame → parse → aggregate → store
//! ```
//!
//! Requests may run concurrently from several threads. Two concurrent misses
//! on the same fingerprint both compute and the later store wins.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::blame::{LineAttribution, parse_line_porcelain};
use crate::cache::{CacheSettings, Fingerprint, ResultCache};
use crate::config::AttributionConfig;
use crate::error::RequestError;
use crate::git::HistoryClient;
use crate::ownership::analyzer::{ContributorMetric, aggregate};

const TEMP_PREFIX: &str = "lineowner-";

/// Result of a successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttributionOutcome {
    /// Contributors ranked by the active count mode. Empty when the file has
    /// nothing to attribute.
    Ranked {
        contributors: Arc<[ContributorMetric]>,
    },
    /// Content exceeds the configured limit (both in bytes).
    FileTooLarge { size: u64, limit: u64 },
    NotInRepository,
}

impl AttributionOutcome {
    /// `FileTooLarge` when `content` exceeds the configured limit.
    pub fn check_size(content: &str, config: &AttributionConfig) -> Option<Self> {
        let size = content.len() as u64;
        let limit = config.max_file_size_bytes();
        (size > limit).then_some(AttributionOutcome::FileTooLarge { size, limit })
    }

    /// Ranked contributors, or `None` for the short-circuit outcomes.
    pub fn contributors(&self) -> Option<&[ContributorMetric]> {
        match self {
            AttributionOutcome::Ranked { contributors } => Some(&contributors[..]),
            _ => None,
        }
    }
}

pub struct Session<H> {
    history: H,
    cache: ResultCache,
}

impl<H: HistoryClient> Session<H> {
    pub fn new(history: H, cache_settings: CacheSettings) -> Self {
        Self {
            history,
            cache: ResultCache::new(cache_settings),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Attribute `content`, the current working copy of `path`.
    pub fn request_attribution(
        &self,
        path: &Path,
        content: &str,
        config: &AttributionConfig,
    ) -> Result<AttributionOutcome, RequestError> {
        if let Some(too_large) = AttributionOutcome::check_size(content, config) {
            debug!(path = %path.display(), ?too_large, "skipping attribution");
            return Ok(too_large);
        }

        if !self.history.is_inside_repository(path)? {
            return Ok(AttributionOutcome::NotInRepository);
        }

        let key = Fingerprint::compute(path, content).tagged(&config.cache_tag());
        if let Some(contributors) = self.cache.lookup(&key) {
            debug!(path = %path.display(), "attribution cache hit");
            return Ok(AttributionOutcome::Ranked { contributors });
        }

        let started = Instant::now();
        let lines = self.attribute(path, content)?;
        let ranked: Arc<[ContributorMetric]> =
            aggregate(&lines, config.count_mode, config.ignore_blank_lines).into();
        debug!(
            path = %path.display(),
            lines = lines.len(),
            contributors = ranked.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "attribution computed"
        );

        self.cache.store(key, Arc::clone(&ranked));
        Ok(AttributionOutcome::Ranked {
            contributors: ranked,
        })
    }

    /// Per-line attribution of `content`, bypassing the cache.
    pub fn attribute_lines(
        &self,
        path: &Path,
        content: &str,
    ) -> Result<Vec<LineAttribution>, RequestError> {
        self.attribute(path, content)
    }

    /// The file changed outside the request path (e.g. it was saved). Drops
    /// every cached ranking for `path`; returns how many were dropped.
    pub fn notify_changed(&self, path: &Path) -> usize {
        let removed = self.cache.invalidate(path);
        debug!(path = %path.display(), removed, "invalidated cached attribution");
        removed
    }

    pub fn sweep(&self) -> usize {
        self.cache.sweep()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn attribute(&self, path: &Path, content: &str) -> Result<Vec<LineAttribution>, RequestError> {
        // Dropped (and deleted) when this function returns, on every path.
        let substitute = if self.needs_substitute(path, content)? {
            Some(materialize(content)?)
        } else {
            None
        };

        let raw = self
            .history
            .line_attribution(path, substitute.as_ref().map(|f| f.path()))?;
        Ok(parse_line_porcelain(&raw, content))
    }

    /// Whether history must be matched against `content` instead of the
    /// committed file.
    fn needs_substitute(&self, path: &Path, content: &str) -> Result<bool, RequestError> {
        if !self.history.is_under_version_control(path)? {
            debug!(path = %path.display(), "untracked, attributing working copy");
            return Ok(true);
        }
        if self.history.has_uncommitted_changes(path)? {
            debug!(path = %path.display(), "modified, attributing working copy");
            return Ok(true);
        }
        // Clean on disk, but the host may hold unsaved edits.
        let on_disk = fs::read_to_string(path).ok();
        Ok(on_disk.as_deref() != Some(content))
    }
}

fn materialize(content: &str) -> Result<NamedTempFile, RequestError> {
    let mut file = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    debug!(path = %file.path().display(), bytes = content.len(), "materialized working copy");
    Ok(file)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
