//! Disk texture storage error handling
//!
//! Every failure here is non-fatal to the emulation session. Errors are
//! logged where they happen with the offending file name and the texture
//! falls back to its natively decoded data.

use std::path::{Path, PathBuf};

use crate::codec::CodecError;
use crate::container::ImageLoadError;

/// Result type for disk texture operations
pub type DiskTextureResult<T> = Result<T, DiskTextureError>;

/// Errors that can occur while dumping, importing or watching textures
#[derive(Debug, thiserror::Error)]
pub enum DiskTextureError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ImageLoadError,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("file watcher error: {0}")]
    Watcher(String),

    #[error("failed to start export worker: {0}")]
    Worker(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl DiskTextureError {
    /// File name (not the full path) the error is about, if any
    pub fn file_name(&self) -> Option<String> {
        let path = match self {
            DiskTextureError::Read { path, .. }
            | DiskTextureError::Write { path, .. }
            | DiskTextureError::Load { path, .. } => path,
            _ => return None,
        };
        Some(display_name(path))
    }
}

/// Helper trait attaching the offending path to I/O results
pub trait IoResultExt<T> {
    fn read_context(self, path: &Path) -> DiskTextureResult<T>;
    fn write_context(self, path: &Path) -> DiskTextureResult<T>;
}

impl<T> IoResultExt<T> for Result<T, std::io::Error> {
    fn read_context(self, path: &Path) -> DiskTextureResult<T> {
        self.map_err(|source| DiskTextureError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_context(self, path: &Path) -> DiskTextureResult<T> {
        self.map_err(|source| DiskTextureError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Helper trait attaching the offending path to container load results
pub trait LoadResultExt<T> {
    fn load_context(self, path: &Path) -> DiskTextureResult<T>;
}

impl<T> LoadResultExt<T> for Result<T, ImageLoadError> {
    fn load_context(self, path: &Path) -> DiskTextureResult<T> {
        self.map_err(|source| DiskTextureError::Load {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Log a failure the way every origin in this crate reports it
pub fn log_failure(error: &DiskTextureError) {
    match error {
        DiskTextureError::Read { path, source } => {
            log::error!("{}", source);
            log::error!(
                "Failed to load \"{}\", see logged error for details.",
                display_name(path)
            );
        }
        DiskTextureError::Write { path, source } => {
            log::error!("{}", source);
            log::error!(
                "Failed to save \"{}\", see logged error for details.",
                display_name(path)
            );
        }
        DiskTextureError::Load { path, source } => {
            log::error!("Failed to load \"{}\" because {}.", display_name(path), source.reason());
        }
        other => log::error!("{}", other),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
