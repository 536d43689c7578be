//! Texture disk cache and live replacement for a GPU emulation layer.
//!
//! Decoded GPU textures are dumped to disk as DDS or per-slice PNG under
//! content addressed names, replacements found in the search directories
//! override the native data when a texture is bound, and edits to the output
//! directory are picked up while the emulated program runs.

pub mod codec;
pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod format;
pub mod hot_reload;
pub mod persistence;
pub mod storage;
pub mod texture;

pub use codec::{CodecBridge, CodecError, PixelCodec};
pub use config::{DiskTextureConfig, OutputFormat};
pub use container::{ImageLoadError, ImageParameters};
pub use error::{DiskTextureError, DiskTextureResult};
pub use format::{Format, FormatInfo, ImageDimensions, ImageFormat, Target, TextureInfoOverride};
pub use hot_reload::{ReloadHandler, ReloadOutcome};
#[cfg(feature = "native")]
pub use hot_reload::ReloadWatcher;
pub use persistence::{parse_file_name, ImportedTexture, ParsedFileName, Registry, TextureName};
pub use storage::DiskTextureStorage;
pub use texture::{TextureHandle, TextureReloader, TextureRequest};
