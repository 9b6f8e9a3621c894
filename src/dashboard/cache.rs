// Time-boxed read cache for the feed. A single entry keyed by the source
// URL; refresh is idempotent and safe to race, last writer wins.

use log::debug;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use sales_metrics::CanonicalRecord;

use crate::dashboard::feed::FeedOutcome;

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    fetched_at: Instant,
    records: Vec<CanonicalRecord>,
    outcome: FeedOutcome,
}

/// Single-entry feed cache. Fallback results are cached like real ones, so
/// a broken feed is not hammered on every render.
#[derive(Debug)]
pub struct FeedCache {
    slot: Mutex<Option<CacheEntry>>,
}

static GLOBAL_CACHE: Lazy<FeedCache> = Lazy::new(FeedCache::new);

impl FeedCache {
    pub fn new() -> FeedCache {
        FeedCache {
            slot: Mutex::new(None),
        }
    }

    /// The process-wide cache used by the dashboard itself.
    pub fn global() -> &'static FeedCache {
        &GLOBAL_CACHE
    }

    /// Returns the cached records when the entry matches the URL and is
    /// still within the validity window.
    pub fn lookup(&self, url: &str, ttl: Duration) -> Option<(Vec<CanonicalRecord>, FeedOutcome)> {
        let guard = self.slot.lock().ok()?;
        match guard.as_ref() {
            Some(entry) if entry.url == url && entry.fetched_at.elapsed() < ttl => {
                debug!("lookup: serving {} records from cache", entry.records.len());
                Some((entry.records.clone(), entry.outcome.clone()))
            }
            _ => None,
        }
    }

    pub fn store(&self, url: &str, records: &[CanonicalRecord], outcome: &FeedOutcome) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(CacheEntry {
                url: url.to_string(),
                fetched_at: Instant::now(),
                records: records.to_vec(),
                outcome: outcome.clone(),
            });
        }
    }
}

impl Default for FeedCache {
    fn default() -> FeedCache {
        FeedCache::new()
    }
}
