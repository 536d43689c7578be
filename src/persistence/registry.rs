//! Shared bookkeeping for the disk cache
//!
//! Two concurrent maps: full path to write stamp, used by the reload watcher
//! to recognise our own writes, and file name to texture handle, used to
//! dispatch reloads. Both are sharded so the export worker, import callers
//! and the watcher never contend on a single lock.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::error::DiskTextureResult;
use crate::texture::TextureHandle;

/// State of the last write this process made to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStamp {
    /// A write is in flight
    Pending,
    /// Finished write, modify time in unix seconds
    Committed(i64),
}

/// Thread-safe write stamps and texture associations
#[derive(Debug, Default)]
pub struct Registry {
    timestamps: DashMap<PathBuf, WriteStamp>,
    associations: DashMap<String, TextureHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` as being written
    pub fn reserve(&self, path: &Path) {
        self.timestamps.insert(path.to_path_buf(), WriteStamp::Pending);
    }

    /// Record the modify time of a finished write
    pub fn commit(&self, path: &Path, timestamp: i64) {
        self.timestamps
            .insert(path.to_path_buf(), WriteStamp::Committed(timestamp));
    }

    /// Forget a failed write
    pub fn rollback(&self, path: &Path) {
        self.timestamps.remove(path);
    }

    pub fn write_stamp(&self, path: &Path) -> Option<WriteStamp> {
        self.timestamps.get(path).map(|stamp| *stamp)
    }

    /// Drop the write stamps of every file inside `directory`
    pub fn forget_writes_under(&self, directory: &Path) {
        self.timestamps.retain(|path, _| !path.starts_with(directory));
    }

    /// Run `write` while `path` is reserved.
    ///
    /// The reservation is committed with the file's modify time when `write`
    /// succeeds and rolled back when it fails or panics.
    pub fn with_reservation<T>(
        &self,
        path: &Path,
        write: impl FnOnce() -> DiskTextureResult<T>,
    ) -> DiskTextureResult<T> {
        self.reserve(path);

        match panic::catch_unwind(AssertUnwindSafe(write)) {
            Ok(Ok(value)) => {
                self.commit(path, modified_time(path).unwrap_or_else(now));
                Ok(value)
            }
            Ok(Err(error)) => {
                self.rollback(path);
                Err(error)
            }
            Err(payload) => {
                self.rollback(path);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Whether the last write to `path` happened within `guard_secs` of `modified`.
    ///
    /// An in-flight write always counts as our own.
    pub fn is_self_write(&self, path: &Path, modified: i64, guard_secs: i64) -> bool {
        match self.write_stamp(path) {
            Some(WriteStamp::Pending) => true,
            Some(WriteStamp::Committed(saved)) => saved > modified.saturating_sub(guard_secs),
            None => false,
        }
    }

    /// Link a file name to the texture it was exported from or imported into
    pub fn associate(&self, file_name: &str, handle: TextureHandle) {
        self.associations.insert(file_name.to_string(), handle);
    }

    pub fn association(&self, file_name: &str) -> Option<TextureHandle> {
        self.associations.get(file_name).map(|handle| *handle)
    }

    pub fn is_tracked(&self, file_name: &str) -> bool {
        self.associations.contains_key(file_name)
    }

    /// Drop every association of a destroyed texture
    pub fn release_texture(&self, handle: TextureHandle) {
        self.associations.retain(|_, associated| *associated != handle);
    }

    pub fn association_count(&self) -> usize {
        self.associations.len()
    }
}

/// Modify time of `path` in unix seconds
pub fn modified_time(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|metadata| metadata.modified()).ok()?;
    Some(unix_seconds(modified))
}

pub fn now() -> i64 {
    unix_seconds(SystemTime::now())
}

fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs() as i64,
        Err(error) => -(error.duration().as_secs() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiskTextureError;
    use tempfile::TempDir;

    #[test]
    fn test_reservation_commits_modify_time() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("a.png");
        let registry = Registry::new();

        registry
            .with_reservation(&path, || {
                assert_eq!(registry.write_stamp(&path), Some(WriteStamp::Pending));
                fs::write(&path, b"data").map_err(|source| DiskTextureError::Write {
                    path: path.clone(),
                    source,
                })
            })
            .expect("write");

        let expected = modified_time(&path).expect("mtime");
        assert_eq!(registry.write_stamp(&path), Some(WriteStamp::Committed(expected)));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let registry = Registry::new();
        let path = Path::new("/nonexistent/a.png");

        let result: DiskTextureResult<()> = registry.with_reservation(path, || {
            Err(DiskTextureError::Watcher("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(registry.write_stamp(path), None);
    }

    #[test]
    fn test_panicking_write_rolls_back() {
        let registry = Registry::new();
        let path = Path::new("b.png");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: DiskTextureResult<()> = registry.with_reservation(path, || panic!("writer panicked"));
        }));

        assert!(outcome.is_err());
        assert_eq!(registry.write_stamp(path), None);
    }

    #[test]
    fn test_self_write_window() {
        let registry = Registry::new();
        let path = Path::new("c.dds");

        assert!(!registry.is_self_write(path, 1_000, 5));

        registry.reserve(path);
        assert!(registry.is_self_write(path, 1_000, 5));

        registry.commit(path, 1_000);
        assert!(registry.is_self_write(path, 1_004, 5));
        assert!(!registry.is_self_write(path, 1_005, 5));
    }

    #[test]
    fn test_forget_writes_under_directory() {
        let registry = Registry::new();
        registry.commit(Path::new("/dump/old/a.png"), 10);
        registry.reserve(Path::new("/dump/old/nested/b.dds"));
        registry.commit(Path::new("/dump/older/c.png"), 10);

        registry.forget_writes_under(Path::new("/dump/old"));

        assert_eq!(registry.write_stamp(Path::new("/dump/old/a.png")), None);
        assert_eq!(registry.write_stamp(Path::new("/dump/old/nested/b.dds")), None);
        assert_eq!(
            registry.write_stamp(Path::new("/dump/older/c.png")),
            Some(WriteStamp::Committed(10))
        );
    }

    #[test]
    fn test_release_texture_drops_all_names() {
        let registry = Registry::new();
        registry.associate("a_0x0.png", TextureHandle(1));
        registry.associate("a_1x0.png", TextureHandle(1));
        registry.associate("b.dds", TextureHandle(2));

        registry.release_texture(TextureHandle(1));

        assert!(!registry.is_tracked("a_0x0.png"));
        assert_eq!(registry.association("b.dds"), Some(TextureHandle(2)));
        assert_eq!(registry.association_count(), 1);
    }
}
