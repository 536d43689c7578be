use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::error::WatcherErrorContext;
use super::handler::ReloadHandler;
use crate::error::DiskTextureResult;

/// Watches the output directory and forwards content changes to a [`ReloadHandler`]
pub struct ReloadWatcher {
    /// Notify watcher instance
    watcher: RecommendedWatcher,

    /// Directory currently watched
    watched: Option<PathBuf>,
}

impl ReloadWatcher {
    /// Create a watcher that is not yet pointed at a directory
    pub fn new(handler: Arc<ReloadHandler>) -> DiskTextureResult<Self> {
        let watcher = notify::recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if is_content_change(&event.kind) {
                    for path in &event.paths {
                        handler.handle_change(path);
                    }
                }
            }
            Err(error) => log::warn!("[ReloadWatcher] Watch error: {}", error),
        })
        .watcher_context("create watcher")?;

        Ok(Self {
            watcher,
            watched: None,
        })
    }

    /// Point the watcher at `directory`, replacing the previous one
    pub fn watch(&mut self, directory: &Path) -> DiskTextureResult<()> {
        self.unwatch();

        self.watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .watcher_context("watch output directory")?;
        self.watched = Some(directory.to_path_buf());

        log::info!("[ReloadWatcher::watch] Watching {} for texture edits", directory.display());
        Ok(())
    }

    /// Stop watching the current directory, if any
    pub fn unwatch(&mut self) {
        if let Some(previous) = self.watched.take() {
            if let Err(error) = self.watcher.unwatch(&previous) {
                log::debug!("[ReloadWatcher::unwatch] {}: {}", previous.display(), error);
            }
        }
    }

    pub fn watched_directory(&self) -> Option<&Path> {
        self.watched.as_deref()
    }
}

/// Content and metadata writes count, renames do not
fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(modify) if !matches!(modify, ModifyKind::Name(_)))
}
