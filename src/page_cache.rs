use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

struct CacheEntry {
    body: String,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Caches full rendered pages, keyed by route and query parameters.
///
/// Entries expire after a fixed interval. Handlers that change what the
/// feed shows call `clear`; everything written behind the application's
/// back is covered by the TTL alone.
pub struct PageCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> PageCache {
        PageCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key,
                CacheEntry {
                    body,
                    created_at: Instant::now(),
                },
            );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
