//! Per-cache-key mutual exclusion
//!
//! Fetchers of one sync run share the cache root. Two sources resolving to the
//! same cache entry must not clone or update it at the same time. A fetcher
//! holds the lock of its entry path until its checkout is final.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

/// Guard returned by [`CacheLocks::lock`]; the entry is unlocked on drop
pub type CacheGuard = ArcMutexGuard<RawMutex, ()>;

/// Lock table keyed by cache entry path
#[derive(Debug, Clone, Default)]
pub struct CacheLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl CacheLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the entry at `key` is free and take it
    pub fn lock(&self, key: &Path) -> CacheGuard {
        self.entry(key).lock_arc()
    }

    #[cfg(test)]
    fn try_lock(&self, key: &Path) -> Option<CacheGuard> {
        self.entry(key).try_lock_arc()
    }

    fn entry(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.to_path_buf()).or_default())
    }
}
