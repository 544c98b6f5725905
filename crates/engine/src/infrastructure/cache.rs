//! Bounded LRU cache keyed by file path and stamped with modification time.
//!
//! An entry is only served while the file's current modification time equals
//! the one recorded at insert; a mismatch evicts it.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use lru::LruCache;
use tokio::sync::Mutex;

struct CacheEntry<V> {
    modified: SystemTime,
    value: Arc<V>,
}

pub struct MtimeCache<V> {
    entries: Mutex<LruCache<PathBuf, CacheEntry<V>>>,
}

impl<V> MtimeCache<V> {
    /// Create a cache holding at most `capacity` paths (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached value if it was parsed from the same file version.
    ///
    /// A stale entry is removed so it can never be returned later.
    pub async fn get_fresh(&self, path: &Path, modified: SystemTime) -> Option<Arc<V>> {
        let mut entries = self.entries.lock().await;
        let cached = entries
            .get(path)
            .map(|entry| (entry.modified == modified, Arc::clone(&entry.value)));
        match cached {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                entries.pop(path);
                None
            }
            None => None,
        }
    }

    /// Insert or replace, evicting the least recently used path when full.
    pub async fn insert(&self, path: PathBuf, modified: SystemTime, value: Arc<V>) {
        let mut entries = self.entries.lock().await;
        if let Some((evicted, _)) = entries.push(path.clone(), CacheEntry { modified, value }) {
            if evicted != path {
                tracing::debug!(path = %evicted.display(), "Evicted template from cache");
            }
        }
    }

    pub async fn remove(&self, path: &Path) {
        self.entries.lock().await.pop(path);
    }

    pub async fn contains(&self, path: &Path) -> bool {
        self.entries.lock().await.contains(path)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
