//! Time-bounded page cache keyed by normalized URL.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// A cached page body. Replaced wholesale, never mutated in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub html: Arc<str>,
    pub fetched_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Live while younger than its ttl.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < self.ttl
    }
}

/// Expiring key-value map shared by all in-flight requests.
///
/// Capacity is a soft bound: inserting a new key into a full cache drops
/// expired entries first, then the oldest fetch.
pub struct PageCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl PageCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Returns the cached body if a live entry exists at `now`.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<str>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| Arc::clone(&entry.html))
    }

    /// Stores `html` under `key`, replacing any previous entry.
    pub fn insert_at(&self, key: String, html: Arc<str>, now: DateTime<Utc>) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| entry.is_live_at(now));

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.fetched_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!("Page cache full, evicting {oldest}");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                html,
                fetched_at: now,
                ttl: self.ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }
}
