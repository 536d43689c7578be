//! Change handling for watched replacement files

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::DiskTextureConfig;
use crate::persistence::registry::{modified_time, Registry};
use crate::texture::{TextureHandle, TextureReloader};

/// What a change notification led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Not a file any texture came from
    Untracked,
    /// Our own write, within the guard window
    SelfWrite,
    /// Still locked after every read attempt, dropped
    Unreadable,
    /// The GPU layer was asked to import the texture again
    Reloaded(TextureHandle),
}

/// Decides whether a changed file should reload its texture
pub struct ReloadHandler {
    registry: Arc<Registry>,
    reloader: Arc<dyn TextureReloader>,
    guard_window_secs: i64,
    read_attempts: u32,
    retry_delay: Duration,
}

impl ReloadHandler {
    pub fn new(
        registry: Arc<Registry>,
        reloader: Arc<dyn TextureReloader>,
        config: &DiskTextureConfig,
    ) -> Self {
        Self {
            registry,
            reloader,
            guard_window_secs: config.reload_guard_window_secs,
            read_attempts: config.reload_read_attempts,
            retry_delay: config.reload_retry_delay(),
        }
    }

    /// React to a content change of `path`
    pub fn handle_change(&self, path: &Path) -> ReloadOutcome {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return ReloadOutcome::Untracked;
        };

        if !self.registry.is_tracked(file_name) {
            return ReloadOutcome::Untracked;
        }

        // An unreadable modify time never matches a committed write
        let modified = modified_time(path).unwrap_or(i64::MAX);
        if self.registry.is_self_write(path, modified, self.guard_window_secs) {
            log::debug!("[ReloadHandler::handle_change] Ignoring our own write to \"{}\"", file_name);
            return ReloadOutcome::SelfWrite;
        }

        if !self.wait_until_readable(path) {
            log::debug!(
                "[ReloadHandler::handle_change] \"{}\" stayed locked, waiting for the next save",
                file_name
            );
            return ReloadOutcome::Unreadable;
        }

        match self.registry.association(file_name) {
            Some(handle) => {
                log::debug!("[ReloadHandler::handle_change] Reloading texture {:?} from \"{}\"", handle, file_name);
                self.reloader.force_reimport(handle);
                ReloadOutcome::Reloaded(handle)
            }
            None => ReloadOutcome::Untracked,
        }
    }

    /// Editors may still hold the file; give them a moment
    fn wait_until_readable(&self, path: &Path) -> bool {
        for attempt in 0..self.read_attempts {
            if fs::read(path).is_ok() {
                return true;
            }

            if attempt + 1 < self.read_attempts {
                thread::sleep(self.retry_delay);
            }
        }

        false
    }
}
