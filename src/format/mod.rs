//! Native GPU texture formats and dimensionality kinds
//!
//! Only the formats the disk cache knows how to dump or replace are listed,
//! plus the BC4/BC5/BC6H family which is named explicitly so it can be
//! rejected up front.

use serde::{Deserialize, Serialize};

/// Native pixel format of a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    R8G8B8A8Unorm,
    R8G8B8A8Srgb,
    R5G6B5Unorm,
    B5G6R5Unorm,
    R5G5B5A1Unorm,
    B5G5R5A1Unorm,
    R5G5B5X1Unorm,
    A1B5G5R5Unorm,
    R4G4B4A4Unorm,
    Bc1RgbaUnorm,
    Bc1RgbaSrgb,
    Bc2Unorm,
    Bc2Srgb,
    Bc3Unorm,
    Bc3Srgb,
    Bc4Unorm,
    Bc4Snorm,
    Bc5Unorm,
    Bc5Snorm,
    Bc6HSfloat,
    Bc6HUfloat,
    Bc7Unorm,
    Bc7Srgb,
    Etc2RgbUnorm,
    Etc2RgbSrgb,
    Etc2RgbPtaUnorm,
    Etc2RgbPtaSrgb,
    Etc2RgbaUnorm,
    Etc2RgbaSrgb,
    Astc4x4Unorm,
    Astc4x4Srgb,
    Astc5x4Unorm,
    Astc5x4Srgb,
    Astc5x5Unorm,
    Astc5x5Srgb,
    Astc6x5Unorm,
    Astc6x5Srgb,
    Astc6x6Unorm,
    Astc6x6Srgb,
    Astc8x5Unorm,
    Astc8x5Srgb,
    Astc8x6Unorm,
    Astc8x6Srgb,
    Astc8x8Unorm,
    Astc8x8Srgb,
    Astc10x5Unorm,
    Astc10x5Srgb,
    Astc10x6Unorm,
    Astc10x6Srgb,
    Astc10x8Unorm,
    Astc10x8Srgb,
    Astc10x10Unorm,
    Astc10x10Srgb,
    Astc12x10Unorm,
    Astc12x10Srgb,
    Astc12x12Unorm,
    Astc12x12Srgb,
}

/// Storage layout family of a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatClass {
    /// Uncompressed, `bytes` per pixel
    Packed { bytes: usize },
    /// Block compressed, `bytes` per `width`x`height` block
    Block { width: usize, height: usize, bytes: usize },
}

impl Format {
    /// Whether the disk cache can dump and replace textures of this format.
    ///
    /// Pure predicate, checked before any file system or codec work.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Format::Bc4Unorm
                | Format::Bc4Snorm
                | Format::Bc5Unorm
                | Format::Bc5Snorm
                | Format::Bc6HSfloat
                | Format::Bc6HUfloat
        )
    }

    /// Whether this is the sRGB flavour of a supported format
    pub fn is_srgb(self) -> bool {
        matches!(
            self,
            Format::R8G8B8A8Srgb
                | Format::Bc1RgbaSrgb
                | Format::Bc2Srgb
                | Format::Bc3Srgb
                | Format::Bc7Srgb
                | Format::Etc2RgbSrgb
                | Format::Etc2RgbPtaSrgb
                | Format::Etc2RgbaSrgb
                | Format::Astc4x4Srgb
                | Format::Astc5x4Srgb
                | Format::Astc5x5Srgb
                | Format::Astc6x5Srgb
                | Format::Astc6x6Srgb
                | Format::Astc8x5Srgb
                | Format::Astc8x6Srgb
                | Format::Astc8x8Srgb
                | Format::Astc10x5Srgb
                | Format::Astc10x6Srgb
                | Format::Astc10x8Srgb
                | Format::Astc10x10Srgb
                | Format::Astc12x10Srgb
                | Format::Astc12x12Srgb
        )
    }

    /// ASTC block footprint, if this is an ASTC format
    pub fn astc_block_size(self) -> Option<(usize, usize)> {
        let size = match self {
            Format::Astc4x4Unorm | Format::Astc4x4Srgb => (4, 4),
            Format::Astc5x4Unorm | Format::Astc5x4Srgb => (5, 4),
            Format::Astc5x5Unorm | Format::Astc5x5Srgb => (5, 5),
            Format::Astc6x5Unorm | Format::Astc6x5Srgb => (6, 5),
            Format::Astc6x6Unorm | Format::Astc6x6Srgb => (6, 6),
            Format::Astc8x5Unorm | Format::Astc8x5Srgb => (8, 5),
            Format::Astc8x6Unorm | Format::Astc8x6Srgb => (8, 6),
            Format::Astc8x8Unorm | Format::Astc8x8Srgb => (8, 8),
            Format::Astc10x5Unorm | Format::Astc10x5Srgb => (10, 5),
            Format::Astc10x6Unorm | Format::Astc10x6Srgb => (10, 6),
            Format::Astc10x8Unorm | Format::Astc10x8Srgb => (10, 8),
            Format::Astc10x10Unorm | Format::Astc10x10Srgb => (10, 10),
            Format::Astc12x10Unorm | Format::Astc12x10Srgb => (12, 10),
            Format::Astc12x12Unorm | Format::Astc12x12Srgb => (12, 12),
            _ => return None,
        };
        Some(size)
    }

    /// Storage layout of one pixel or block
    pub fn class(self) -> FormatClass {
        if let Some((width, height)) = self.astc_block_size() {
            return FormatClass::Block { width, height, bytes: 16 };
        }

        match self {
            Format::R8G8B8A8Unorm | Format::R8G8B8A8Srgb => FormatClass::Packed { bytes: 4 },
            Format::R5G6B5Unorm
            | Format::B5G6R5Unorm
            | Format::R5G5B5A1Unorm
            | Format::B5G5R5A1Unorm
            | Format::R5G5B5X1Unorm
            | Format::A1B5G5R5Unorm
            | Format::R4G4B4A4Unorm => FormatClass::Packed { bytes: 2 },
            Format::Bc1RgbaUnorm
            | Format::Bc1RgbaSrgb
            | Format::Bc4Unorm
            | Format::Bc4Snorm
            | Format::Etc2RgbUnorm
            | Format::Etc2RgbSrgb
            | Format::Etc2RgbPtaUnorm
            | Format::Etc2RgbPtaSrgb => FormatClass::Block { width: 4, height: 4, bytes: 8 },
            _ => FormatClass::Block { width: 4, height: 4, bytes: 16 },
        }
    }

    /// Size in bytes of one `width`x`height` slice stored in this format
    pub fn slice_size(self, width: usize, height: usize) -> usize {
        match self.class() {
            FormatClass::Packed { bytes } => width * height * bytes,
            FormatClass::Block { width: bw, height: bh, bytes } => {
                width.div_ceil(bw) * height.div_ceil(bh) * bytes
            }
        }
    }
}

/// Dimensionality kind of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Texture1D,
    Texture2D,
    Texture2DArray,
    Texture3D,
    Cubemap,
    CubemapArray,
    TextureBuffer,
}

impl Target {
    /// File name prefix used by the naming contract
    pub fn name_prefix(self) -> &'static str {
        match self {
            Target::Texture2D => "tex2d",
            Target::Texture2DArray => "texa2d",
            Target::Texture3D => "tex3d",
            Target::Cubemap => "texcube",
            Target::CubemapArray => "texacube",
            _ => "tex",
        }
    }

    /// Container dimension for DDS export, `None` for kinds DDS cannot hold
    pub fn image_dimensions(self) -> Option<ImageDimensions> {
        match self {
            Target::Texture2D => Some(ImageDimensions::Dim2D),
            Target::Texture2DArray => Some(ImageDimensions::Dim2DArray),
            Target::Texture3D => Some(ImageDimensions::Dim3D),
            Target::Cubemap => Some(ImageDimensions::DimCube),
            Target::CubemapArray => Some(ImageDimensions::DimCubeArray),
            _ => None,
        }
    }
}

/// Pixel formats an on-disk container can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Bc1RgbaUnorm,
    Bc2Unorm,
    Bc3Unorm,
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
    R5G6B5Unorm,
    R5G5B5A1Unorm,
    R4G4B4A4Unorm,
}

impl ImageFormat {
    /// Container format a native format can be stored as without conversion
    pub fn from_native(format: Format) -> Option<Self> {
        let image_format = match format {
            Format::Bc1RgbaUnorm | Format::Bc1RgbaSrgb => ImageFormat::Bc1RgbaUnorm,
            Format::Bc2Unorm | Format::Bc2Srgb => ImageFormat::Bc2Unorm,
            Format::Bc3Unorm | Format::Bc3Srgb => ImageFormat::Bc3Unorm,
            Format::R8G8B8A8Unorm | Format::R8G8B8A8Srgb => ImageFormat::R8G8B8A8Unorm,
            Format::R5G6B5Unorm => ImageFormat::R5G6B5Unorm,
            Format::R5G5B5A1Unorm => ImageFormat::R5G5B5A1Unorm,
            Format::R4G4B4A4Unorm => ImageFormat::R4G4B4A4Unorm,
            _ => return None,
        };
        Some(image_format)
    }

    /// Native layout of the stored payload
    pub fn class(self) -> FormatClass {
        match self {
            ImageFormat::Bc1RgbaUnorm => FormatClass::Block { width: 4, height: 4, bytes: 8 },
            ImageFormat::Bc2Unorm | ImageFormat::Bc3Unorm => {
                FormatClass::Block { width: 4, height: 4, bytes: 16 }
            }
            ImageFormat::R8G8B8A8Unorm | ImageFormat::B8G8R8A8Unorm => FormatClass::Packed { bytes: 4 },
            ImageFormat::R5G6B5Unorm | ImageFormat::R5G5B5A1Unorm | ImageFormat::R4G4B4A4Unorm => {
                FormatClass::Packed { bytes: 2 }
            }
        }
    }

    pub fn slice_size(self, width: usize, height: usize) -> usize {
        match self.class() {
            FormatClass::Packed { bytes } => width * height * bytes,
            FormatClass::Block { width: bw, height: bh, bytes } => {
                width.div_ceil(bw) * height.div_ceil(bh) * bytes
            }
        }
    }

    /// Like `slice_size`, for dimensions read from a file. `None` on overflow.
    pub fn checked_slice_size(self, width: usize, height: usize) -> Option<usize> {
        match self.class() {
            FormatClass::Packed { bytes } => width.checked_mul(height)?.checked_mul(bytes),
            FormatClass::Block { width: bw, height: bh, bytes } => {
                width.div_ceil(bw).checked_mul(height.div_ceil(bh))?.checked_mul(bytes)
            }
        }
    }
}

/// Container dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageDimensions {
    Dim2D,
    Dim2DArray,
    Dim3D,
    DimCube,
    DimCubeArray,
}

/// Compact description of a native format handed back with an override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub format: Format,
    pub block_width: u32,
    pub block_height: u32,
    pub bytes_per_pixel: u32,
    pub components: u32,
}

impl FormatInfo {
    pub const fn new(
        format: Format,
        block_width: u32,
        block_height: u32,
        bytes_per_pixel: u32,
        components: u32,
    ) -> Self {
        Self {
            format,
            block_width,
            block_height,
            bytes_per_pixel,
            components,
        }
    }

    /// RGBA8 in the srgb-ness of the texture being replaced
    pub fn rgba8(srgb: bool) -> Self {
        let format = if srgb { Format::R8G8B8A8Srgb } else { Format::R8G8B8A8Unorm };
        Self::new(format, 1, 1, 4, 4)
    }

    /// Native format for a payload loaded from a container.
    ///
    /// `srgb` comes from the texture being replaced, never from the file.
    pub fn for_import(format: ImageFormat, srgb: bool) -> Self {
        match format {
            ImageFormat::Bc1RgbaUnorm => Self::new(
                if srgb { Format::Bc1RgbaSrgb } else { Format::Bc1RgbaUnorm },
                4,
                4,
                8,
                4,
            ),
            ImageFormat::Bc2Unorm => Self::new(
                if srgb { Format::Bc2Srgb } else { Format::Bc2Unorm },
                4,
                4,
                16,
                4,
            ),
            ImageFormat::Bc3Unorm => Self::new(
                if srgb { Format::Bc3Srgb } else { Format::Bc3Unorm },
                4,
                4,
                16,
                4,
            ),
            ImageFormat::R8G8B8A8Unorm | ImageFormat::B8G8R8A8Unorm => Self::rgba8(srgb),
            ImageFormat::R5G6B5Unorm => Self::new(Format::R5G6B5Unorm, 1, 1, 2, 3),
            ImageFormat::R5G5B5A1Unorm => Self::new(Format::R5G5B5A1Unorm, 1, 1, 2, 4),
            ImageFormat::R4G4B4A4Unorm => Self::new(Format::R4G4B4A4Unorm, 1, 1, 2, 4),
        }
    }
}

/// Replacement shape and format returned by a successful import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfoOverride {
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    pub levels: u32,
    pub format_info: FormatInfo,
}
