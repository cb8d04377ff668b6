// In-memory TTL cache shared across HTTP workers
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedEntry<V> {
    value: V,
    timestamp: Instant,
}

/// Key-value cache where every entry expires a fixed time after insertion.
///
/// Cloning is cheap and every clone sees the same entries. Expired entries
/// read as absent and are dropped on the next write or `purge_expired`.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, CachedEntry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let cached = entries.get(key)?;

        let age = cached.timestamp.elapsed();
        if age < self.ttl {
            log::debug!("📦 Cache hit for {} (age: {}s)", key, age.as_secs());
            Some(cached.value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: String, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            let ttl = self.ttl;
            entries.retain(|_, cached| cached.timestamp.elapsed() < ttl);
            log::debug!("💾 Cached {} for {}s", key, ttl.as_secs());
            entries.insert(
                key,
                CachedEntry {
                    value,
                    timestamp: Instant::now(),
                },
            );
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                let ttl = self.ttl;
                entries.retain(|_, cached| cached.timestamp.elapsed() < ttl);
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Number of entries still alive.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .values()
                    .filter(|cached| cached.timestamp.elapsed() < self.ttl)
                    .count()
            })
            .unwrap_or(0)
    }
}
