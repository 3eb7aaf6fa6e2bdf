//! Scratch storage for transcode temp files.
//!
//! Paths are unique across concurrent jobs (millisecond timestamp plus a
//! random suffix). Deletion is best-effort and must be invoked on every
//! pipeline exit path.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::MediaResult;

/// Temp-file allocator rooted at a single directory.
#[derive(Debug, Clone)]
pub struct Scratch {
    root: PathBuf,
}

impl Scratch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scratch rooted at the OS temp directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Allocate a unique path. Nothing is created on disk.
    pub fn allocate(&self, prefix: &str, ext: &str) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let suffix = Uuid::new_v4().simple();
        self.root.join(format!("{}-{}-{}.{}", prefix, millis, suffix, ext))
    }

    /// Write bytes to a scratch path, creating the root if needed.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> MediaResult<()> {
        fs::create_dir_all(&self.root).await?;
        fs::write(path, bytes).await?;
        Ok(())
    }

    /// Delete scratch paths, best-effort. Paths that were never created are
    /// fine; real failures are logged and swallowed.
    pub async fn discard(&self, paths: &[&Path]) {
        for path in paths {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_allocated_paths_are_unique() {
        let scratch = Scratch::system();
        let a = scratch.allocate("pixl-in", "mp4");
        let b = scratch.allocate("pixl-in", "mp4");
        assert_ne!(a, b);
        assert!(a.to_string_lossy().ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_write_and_discard() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new(dir.path());

        let path = scratch.allocate("pixl-in", "mp4");
        scratch.write(&path, b"bytes").await.unwrap();
        assert!(path.exists());

        scratch.discard(&[path.as_path()]).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_discard_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new(dir.path());

        let never_written = scratch.allocate("pixl-out", "mp4");
        scratch.discard(&[never_written.as_path()]).await;
    }

    #[tokio::test]
    async fn test_write_creates_missing_root() {
        let dir = TempDir::new().unwrap();
        let scratch = Scratch::new(dir.path().join("nested"));

        let path = scratch.allocate("pixl-in", "mp4");
        scratch.write(&path, b"bytes").await.unwrap();
        assert!(path.exists());
    }
}
