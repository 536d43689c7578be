//! Reload watcher error handling
//!
//! Watcher failures never reach the GPU layer; they are turned into
//! `DiskTextureError::Watcher` with the operation that failed.

use std::fmt::Display;

use crate::error::{DiskTextureError, DiskTextureResult};

/// Helper trait naming the watcher operation a failure came from
pub trait WatcherErrorContext<T> {
    fn watcher_context(self, context: &str) -> DiskTextureResult<T>;
}

impl<T, E: Display> WatcherErrorContext<T> for Result<T, E> {
    fn watcher_context(self, context: &str) -> DiskTextureResult<T> {
        self.map_err(|error| watcher_error(context, error))
    }
}

/// Create a watcher error
pub fn watcher_error(context: &str, error: impl Display) -> DiskTextureError {
    DiskTextureError::Watcher(format!("{}: {}", context, error))
}
