/// Live reload of replacement textures
///
/// Watches the output directory while real-time edit is enabled and asks
/// the GPU layer to import a texture again when one of its files changes.
///
/// Key features:
/// - Self-write suppression through the registry's write stamps
/// - Bounded read retries for files editors still hold open
/// - Watcher re-pointed whenever the output directory changes
pub mod error;
pub mod handler;
#[cfg(feature = "native")]
pub mod watcher;

pub use error::{watcher_error, WatcherErrorContext};
pub use handler::{ReloadHandler, ReloadOutcome};
#[cfg(feature = "native")]
pub use watcher::ReloadWatcher;
