//! On-disk image containers
//!
//! DDS holds a whole texture (every level and slice) in a compact payload,
//! PNG holds exactly one RGBA8 slice.

pub mod dds;
pub mod png;

use crate::format::{ImageDimensions, ImageFormat};

/// Header of a container, everything but the pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageParameters {
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    pub levels: u32,
    pub format: ImageFormat,
    pub dimensions: ImageDimensions,
}

impl ImageParameters {
    pub fn new(
        width: u32,
        height: u32,
        depth_or_layers: u32,
        levels: u32,
        format: ImageFormat,
        dimensions: ImageDimensions,
    ) -> Self {
        Self {
            width,
            height,
            depth_or_layers,
            levels,
            format,
            dimensions,
        }
    }

    /// Single 2D RGBA8 image, the shape of every PNG slice
    pub fn rgba8_2d(width: u32, height: u32) -> Self {
        Self::new(width, height, 1, 1, ImageFormat::R8G8B8A8Unorm, ImageDimensions::Dim2D)
    }
}

/// Reasons a container could not be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImageLoadError {
    #[error("corrupted header")]
    CorruptedHeader,

    #[error("corrupted data")]
    CorruptedData,

    #[error("data too short")]
    DataTooShort,

    #[error("output buffer too short")]
    OutputTooShort,

    #[error("unsupported format")]
    UnsupportedFormat,
}

impl ImageLoadError {
    /// Sentence fragment used in load failure logs
    pub fn reason(self) -> &'static str {
        match self {
            ImageLoadError::CorruptedHeader => "the file header is corrupted",
            ImageLoadError::CorruptedData => "the file data is corrupted",
            ImageLoadError::DataTooShort => "some data is missing from the file",
            ImageLoadError::OutputTooShort => "the output buffer was not large enough",
            ImageLoadError::UnsupportedFormat => "the image format is not currently supported",
        }
    }
}

/// Result type for container parsing
pub type ImageLoadResult<T> = Result<T, ImageLoadError>;
