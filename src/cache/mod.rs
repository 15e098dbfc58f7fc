//! In-memory result cache keyed by file fingerprint.
//!
//! Entries expire after a TTL and the cache holds at most `max_entries`
//! live entries, evicting the oldest-inserted first. Reading an entry does
//! not extend its life. All operations take `&self` and are safe to call
//! from concurrent requests.

pub mod fingerprint;

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::ownership::analyzer::ContributorMetric;
pub use fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    #[serde(rename = "ttl_secs", with = "crate::config::secs")]
    pub ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_entries: 100,
        }
    }
}

struct CacheEntry {
    fingerprint: Fingerprint,
    data: Arc<[ContributorMetric]>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    fn remove_where(&mut self, mut pred: impl FnMut(&str, &CacheEntry) -> bool) -> usize {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(k, e)| pred(k.as_str(), e))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_front() {
            Some(key) => {
                self.entries.remove(&key);
                debug!(key = %key, "evicted oldest cache entry");
                true
            }
            None => false,
        }
    }
}

pub struct ResultCache {
    inner: Mutex<Inner>,
    settings: CacheSettings,
}

impl ResultCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Cached ranking for `fp`, or `None` if absent or expired. Expired
    /// entries are removed.
    pub fn lookup(&self, fp: &Fingerprint) -> Option<Arc<[ContributorMetric]>> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get(fp.as_str())?;
        if entry.is_expired(Instant::now()) {
            inner.remove(fp.as_str());
            return None;
        }
        Some(Arc::clone(&entry.data))
    }

    pub fn store(&self, fp: Fingerprint, data: impl Into<Arc<[ContributorMetric]>>) {
        self.store_with_ttl(fp, data, self.settings.ttl);
    }

    /// Insert or overwrite `fp`. An overwritten key moves to the back of the
    /// eviction order.
    pub fn store_with_ttl(
        &self,
        fp: Fingerprint,
        data: impl Into<Arc<[ContributorMetric]>>,
        ttl: Duration,
    ) {
        let max = self.settings.max_entries;
        if max == 0 {
            return;
        }
        let now = Instant::now();
        let key = fp.as_str().to_string();
        let mut inner = self.inner.lock();

        if !inner.remove(&key) && inner.entries.len() >= max {
            inner.remove_where(|_, e| e.is_expired(now));
            while inner.entries.len() >= max && inner.evict_oldest() {}
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            CacheEntry {
                fingerprint: fp,
                data: data.into(),
                created_at: now,
                ttl,
            },
        );
    }

    /// Drop every entry for `path`, live or not. Returns how many went.
    pub fn invalidate(&self, path: &Path) -> usize {
        self.inner
            .lock()
            .remove_where(|_, e| e.fingerprint.belongs_to(path))
    }

    /// Drop expired entries. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        self.inner.lock().remove_where(|_, e| e.is_expired(now))
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
