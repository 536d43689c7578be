//! Disk texture storage
//!
//! Entry point used by the GPU layer. Owns the search directories, the
//! export queue and the reload watcher, and shares one [`Registry`] between
//! them. Every method takes `&self` so the storage can sit behind an `Arc`
//! and be called from any GPU thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
#[cfg(feature = "native")]
use parking_lot::Mutex;

use crate::codec::{CodecBridge, PixelCodec};
use crate::config::{DiskTextureConfig, OutputFormat};
#[cfg(feature = "native")]
use crate::error::log_failure;
use crate::error::DiskTextureResult;
use crate::hot_reload::ReloadHandler;
#[cfg(feature = "native")]
use crate::hot_reload::ReloadWatcher;
use crate::persistence::{ExportEncoder, ExportJob, ExportQueue, ImportScanner, ImportedTexture, Registry};
use crate::texture::{TextureHandle, TextureReloader, TextureRequest};

#[derive(Debug, Default)]
struct Directories {
    output: Option<PathBuf>,
    /// Searched in order on import, includes `output`
    search: Vec<PathBuf>,
}

/// Texture dump and replacement storage
pub struct DiskTextureStorage {
    enable_dump: bool,
    output_format: OutputFormat,
    registry: Arc<Registry>,
    scanner: ImportScanner,
    directories: RwLock<Directories>,
    export_queue: Option<ExportQueue>,
    reload_handler: Option<Arc<ReloadHandler>>,
    #[cfg(feature = "native")]
    watcher: Option<Mutex<ReloadWatcher>>,
}

impl DiskTextureStorage {
    /// Create the storage with the default codec
    pub fn new(config: DiskTextureConfig, reloader: Arc<dyn TextureReloader>) -> DiskTextureResult<Self> {
        Self::with_codec(config, reloader, Arc::new(CodecBridge))
    }

    /// Create the storage with a custom pixel codec.
    ///
    /// The export worker only exists when dumping is enabled and the watcher
    /// only when real-time edit is enabled.
    pub fn with_codec(
        config: DiskTextureConfig,
        reloader: Arc<dyn TextureReloader>,
        codec: Arc<dyn PixelCodec>,
    ) -> DiskTextureResult<Self> {
        let registry = Arc::new(Registry::new());

        let export_queue = if config.enable_dump {
            Some(ExportQueue::new(ExportEncoder::new(registry.clone(), codec))?)
        } else {
            None
        };

        let reload_handler = config
            .enable_real_time_edit
            .then(|| Arc::new(ReloadHandler::new(registry.clone(), reloader, &config)));

        #[cfg(feature = "native")]
        let watcher = match &reload_handler {
            Some(handler) => Some(Mutex::new(ReloadWatcher::new(handler.clone())?)),
            None => None,
        };

        let storage = Self {
            enable_dump: config.enable_dump,
            output_format: config.output_format,
            scanner: ImportScanner::new(registry.clone()),
            registry,
            directories: RwLock::new(Directories::default()),
            export_queue,
            reload_handler,
            #[cfg(feature = "native")]
            watcher,
        };

        if let Some(output_directory) = &config.output_directory {
            storage.set_output_directory(output_directory);
        }

        for directory in &config.input_directories {
            storage.add_input_directory(directory);
        }

        log::info!(
            "[DiskTextureStorage::new] dump: {}, format: {:?}, real-time edit: {}",
            storage.enable_dump,
            storage.output_format,
            storage.reload_handler.is_some()
        );

        Ok(storage)
    }

    /// Append a search directory. Ignored unless it exists and is not listed yet.
    pub fn add_input_directory(&self, directory: impl AsRef<Path>) {
        let Some(directory) = resolve_directory(directory.as_ref()) else {
            log::debug!(
                "[DiskTextureStorage::add_input_directory] Ignoring missing directory {}",
                directory.as_ref().display()
            );
            return;
        };

        let mut directories = self.directories.write();
        if !directories.search.contains(&directory) {
            directories.search.push(directory);
        }
    }

    /// Replace the output directory.
    ///
    /// The previous one leaves the search list and its write stamps are
    /// dropped. A directory that does not exist clears the output directory
    /// instead.
    pub fn set_output_directory(&self, directory: impl AsRef<Path>) {
        let directory = resolve_directory(directory.as_ref());

        {
            let mut directories = self.directories.write();

            if let Some(previous) = directories.output.take() {
                directories.search.retain(|listed| *listed != previous);
                self.registry.forget_writes_under(&previous);
            }

            if let Some(directory) = &directory {
                directories.output = Some(directory.clone());
                if !directories.search.contains(directory) {
                    directories.search.push(directory.clone());
                }
            }
        }

        self.repoint_watcher(directory.as_deref());
    }

    #[cfg(feature = "native")]
    fn repoint_watcher(&self, directory: Option<&Path>) {
        let Some(watcher) = &self.watcher else {
            return;
        };

        let mut watcher = watcher.lock();
        match directory {
            Some(directory) => {
                if let Err(error) = watcher.watch(directory) {
                    log_failure(&error);
                }
            }
            None => watcher.unwatch(),
        }
    }

    #[cfg(not(feature = "native"))]
    fn repoint_watcher(&self, _directory: Option<&Path>) {}

    /// Whether there is anything to dump to or import from
    pub fn is_active(&self) -> bool {
        let directories = self.directories.read();
        directories.output.is_some() || !directories.search.is_empty()
    }

    pub fn output_directory(&self) -> Option<PathBuf> {
        self.directories.read().output.clone()
    }

    pub fn search_directories(&self) -> Vec<PathBuf> {
        self.directories.read().search.clone()
    }

    /// Queue `request` for dumping, returns immediately
    pub fn enqueue_export(&self, handle: TextureHandle, request: TextureRequest) {
        if !self.enable_dump {
            return;
        }

        let (Some(queue), Some(output_directory)) = (&self.export_queue, self.output_directory()) else {
            return;
        };

        queue.push(ExportJob {
            handle,
            request,
            output_directory,
            output_format: self.output_format,
        });
    }

    /// Look for a replacement of `request`, blocking on file reads
    pub fn try_import(&self, handle: TextureHandle, request: &TextureRequest) -> Option<ImportedTexture> {
        let directories = self.search_directories();
        self.scanner.try_import(&directories, handle, request)
    }

    /// Forget every file associated with a destroyed texture
    pub fn release_texture(&self, handle: TextureHandle) {
        self.registry.release_texture(handle);
    }

    /// Block until every export queued so far has been written
    pub fn flush_exports(&self) {
        if let Some(queue) = &self.export_queue {
            queue.flush();
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Change handler used by the watcher, present when real-time edit is on
    pub fn reload_handler(&self) -> Option<&Arc<ReloadHandler>> {
        self.reload_handler.as_ref()
    }
}

/// Canonical form of an existing directory.
///
/// Write stamps are keyed by full path and the watcher reports absolute
/// paths, so relative or symlinked spellings must not reach the registry.
fn resolve_directory(directory: &Path) -> Option<PathBuf> {
    if !directory.is_dir() {
        return None;
    }

    match std::fs::canonicalize(directory) {
        Ok(resolved) => Some(resolved),
        Err(error) => {
            log::warn!(
                "[DiskTextureStorage::resolve_directory] Cannot resolve {}: {}",
                directory.display(),
                error
            );
            None
        }
    }
}
