//! Cache storage backends.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::key::JobKey;

/// Best-effort, write-once blob store keyed by job identity.
///
/// Implementations must treat `get` misses as normal and must never let a
/// `put` failure surface to the caller.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// Fetch a cached result. `None` is a miss, never an error.
    async fn get(&self, key: &JobKey) -> Option<Vec<u8>>;

    /// Store a result. Best-effort: failures are logged and swallowed, and
    /// an existing entry is never rewritten.
    async fn put(&self, key: &JobKey, bytes: &[u8]);
}

/// Filesystem cache: one file per key under a root directory.
pub struct FsCache {
    root: PathBuf,
}

impl FsCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, key: &JobKey) -> PathBuf {
        self.root.join(key.as_hex())
    }
}

#[async_trait]
impl ContentCache for FsCache {
    async fn get(&self, key: &JobKey) -> Option<Vec<u8>> {
        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => {
                debug!(key = %key, size = bytes.len(), "Result cache hit");
                Some(bytes)
            }
            Err(_) => {
                debug!(key = %key, "Result cache miss");
                None
            }
        }
    }

    async fn put(&self, key: &JobKey, bytes: &[u8]) {
        let path = self.entry_path(key);
        if fs::try_exists(&path).await.unwrap_or(false) {
            return;
        }
        if let Err(e) = fs::create_dir_all(&self.root).await {
            warn!(error = %e, "Could not create cache directory, skipping store");
            return;
        }
        // Write to a temp name then rename so readers never see a partial entry
        let tmp = self.root.join(format!("{}.tmp", key.as_hex()));
        if let Err(e) = fs::write(&tmp, bytes).await {
            warn!(key = %key, error = %e, "Cache store failed");
            let _ = fs::remove_file(&tmp).await;
            return;
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            warn!(key = %key, error = %e, "Cache store rename failed");
            let _ = fs::remove_file(&tmp).await;
        }
    }
}

/// In-memory cache, used as a test double for the pipelines.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn get(&self, key: &JobKey) -> Option<Vec<u8>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key.as_hex())
            .cloned()
    }

    async fn put(&self, key: &JobKey, bytes: &[u8]) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key.as_hex().to_string())
            .or_insert_with(|| bytes.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(n: u8) -> JobKey {
        JobKey::compute(&[n], &[])
    }

    #[tokio::test]
    async fn test_fs_cache_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cache = FsCache::new(dir.path());

        assert!(cache.get(&key(1)).await.is_none());
        cache.put(&key(1), b"rendition").await;
        assert_eq!(cache.get(&key(1)).await.unwrap(), b"rendition");
    }

    #[tokio::test]
    async fn test_fs_cache_is_write_once() {
        let dir = TempDir::new().unwrap();
        let cache = FsCache::new(dir.path());

        cache.put(&key(1), b"first").await;
        cache.put(&key(1), b"second").await;
        assert_eq!(cache.get(&key(1)).await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn test_fs_cache_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let cache = FsCache::new(dir.path().join("nested/cache"));

        cache.put(&key(2), b"data").await;
        assert_eq!(cache.get(&key(2)).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_fs_cache_store_failure_is_swallowed() {
        // Root is a file, so every write fails; put must not panic or error
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();

        let cache = FsCache::new(&blocked);
        cache.put(&key(3), b"data").await;
        assert!(cache.get(&key(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_roundtrip_and_write_once() {
        let cache = MemoryCache::new();

        cache.put(&key(1), b"first").await;
        cache.put(&key(1), b"second").await;
        assert_eq!(cache.get(&key(1)).await.unwrap(), b"first");
        assert_eq!(cache.len(), 1);
    }
}
