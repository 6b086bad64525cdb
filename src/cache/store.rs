//! Cache storage.
//!
//! Holds buffered HTTP responses for the cacheable feed routes, bounded by
//! an LRU limit and aged out by a fixed TTL.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use time::{Duration, OffsetDateTime};

use super::clock::Clock;
use super::config::CacheConfig;
use super::keys::PageKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// A buffered response held for replay.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: OffsetDateTime,
}

/// Response cache for feed pages.
///
/// Entries are served until their TTL lapses or the cache is flushed. The
/// store never invalidates an entry because underlying data changed; edits
/// and deletions stay invisible until expiry, and only publishing a post or
/// an explicit administrative flush empties it early.
pub struct PageCache {
    entries: RwLock<LruCache<PageKey, CachedPage>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PageCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_pages_non_zero())),
            ttl: config.ttl(),
            clock,
        }
    }

    /// The stored entry for the key, if it is still within its TTL. Expired
    /// entries are dropped on the spot and count as misses.
    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(page) if now - page.stored_at < self.ttl => {
                counter!("foglio_page_cache_hit_total").increment(1);
                Some(page.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("foglio_page_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("foglio_page_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: PageKey, status: u16, headers: Vec<(String, String)>, body: Bytes) {
        let page = CachedPage {
            status,
            headers,
            body,
            stored_at: self.clock.now(),
        };
        counter!("foglio_page_cache_store_total").increment(1);
        rw_write(&self.entries, SOURCE, "insert").put(key, page);
    }

    /// Drop every cached page, returning how many were dropped.
    pub fn flush(&self) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "flush");
        let dropped = entries.len();
        entries.clear();
        counter!("foglio_page_cache_flush_total").increment(1);
        dropped
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
