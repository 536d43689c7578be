//! DDS container
//!
//! Writes the classic 128 byte header, plus the DX10 extension for array
//! and cube array textures. Texture data in memory is level-major while DDS
//! stores every mip of a layer before the next layer, so payloads are
//! reordered on the way in and out. Volume textures are level-major in both.

use std::io::{self, Write};

use bytemuck::{Pod, Zeroable};

use super::{ImageLoadError, ImageLoadResult, ImageParameters};
use crate::format::{ImageDimensions, ImageFormat};
use crate::texture::mip_extent;

const MAGIC: [u8; 4] = *b"DDS ";
const HEADER_SIZE: usize = 124;
const DX10_HEADER_SIZE: usize = 20;
const PIXEL_FORMAT_SIZE: u32 = 32;
const MAX_LEVELS: u32 = 32;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PITCH: u32 = 0x8;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;
const DDSD_DEPTH: u32 = 0x800000;

const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x400000;

const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_CUBEMAP_ALL_FACES: u32 = 0xfc00;
const DDSCAPS2_VOLUME: u32 = 0x200000;

const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
const D3D10_RESOURCE_DIMENSION_TEXTURE3D: u32 = 4;
const D3D10_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

const DXGI_FORMAT_R8G8B8A8_UNORM: u32 = 28;
const DXGI_FORMAT_R8G8B8A8_UNORM_SRGB: u32 = 29;
const DXGI_FORMAT_BC1_UNORM: u32 = 71;
const DXGI_FORMAT_BC1_UNORM_SRGB: u32 = 72;
const DXGI_FORMAT_BC2_UNORM: u32 = 74;
const DXGI_FORMAT_BC2_UNORM_SRGB: u32 = 75;
const DXGI_FORMAT_BC3_UNORM: u32 = 77;
const DXGI_FORMAT_BC3_UNORM_SRGB: u32 = 78;
const DXGI_FORMAT_B8G8R8A8_UNORM: u32 = 87;
const DXGI_FORMAT_B8G8R8A8_UNORM_SRGB: u32 = 91;

const CUBE_FACES: u32 = 6;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DdsPixelFormat {
    size: u32,
    flags: u32,
    four_cc: [u8; 4],
    rgb_bit_count: u32,
    r_mask: u32,
    g_mask: u32,
    b_mask: u32,
    a_mask: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DdsHeader {
    size: u32,
    flags: u32,
    height: u32,
    width: u32,
    pitch_or_linear_size: u32,
    depth: u32,
    mip_map_count: u32,
    reserved1: [u32; 11],
    pixel_format: DdsPixelFormat,
    caps: u32,
    caps2: u32,
    caps3: u32,
    caps4: u32,
    reserved2: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DdsHeaderDx10 {
    dxgi_format: u32,
    resource_dimension: u32,
    misc_flag: u32,
    array_size: u32,
    misc_flags2: u32,
}

/// Whether DDS can hold `format` for a texture of `dimensions` without conversion.
///
/// Array kinds need the DX10 header, which has no code for the packed 16-bit
/// layouts used here.
pub fn can_store(format: ImageFormat, dimensions: ImageDimensions) -> bool {
    !needs_dx10(dimensions) || dxgi_format(format).is_some()
}

/// Read and validate the header of a DDS file.
///
/// The file must hold the whole payload the header describes, so
/// `calculate_size` of the result never exceeds the file length.
pub fn load_header(file: &[u8]) -> ImageLoadResult<ImageParameters> {
    parse(file).map(|(parameters, _, _)| parameters)
}

/// Payload size in bytes of a texture described by `parameters`.
///
/// Saturates at `usize::MAX` for sizes that do not fit in memory.
pub fn calculate_size(parameters: &ImageParameters) -> usize {
    checked_size(parameters).unwrap_or(usize::MAX)
}

/// Copy the payload of a DDS file into `output` in level-major order
pub fn load_data(file: &[u8], output: &mut [u8]) -> ImageLoadResult<()> {
    let (parameters, data_offset, size) = parse(file)?;

    if output.len() < size {
        return Err(ImageLoadError::OutputTooShort);
    }

    let payload = &file[data_offset..data_offset + size];

    if is_layer_major(&parameters) {
        for (source, target) in layer_major_offsets(&parameters) {
            output[target.0..target.0 + target.1].copy_from_slice(&payload[source..source + target.1]);
        }
    } else {
        output[..size].copy_from_slice(payload);
    }

    Ok(())
}

/// Write `data` (level-major) as a DDS file described by `parameters`
pub fn save<W: Write>(writer: &mut W, parameters: &ImageParameters, data: &[u8]) -> io::Result<()> {
    let size = calculate_size(parameters);

    if data.len() < size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("texture data is {} bytes, {} required", data.len(), size),
        ));
    }

    let dx10 = if needs_dx10(parameters.dimensions) {
        let dxgi_format = dxgi_format(parameters.format).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} cannot be stored in an array DDS", parameters.format),
            )
        })?;
        Some(build_dx10_header(parameters, dxgi_format))
    } else {
        None
    };

    let header = build_header(parameters, dx10.is_some());

    writer.write_all(&MAGIC)?;
    writer.write_all(bytemuck::bytes_of(&header))?;
    if let Some(dx10) = dx10 {
        writer.write_all(bytemuck::bytes_of(&dx10))?;
    }

    if is_layer_major(parameters) {
        let mut payload = vec![0u8; size];
        for (target, source) in layer_major_offsets(parameters) {
            payload[target..target + source.1].copy_from_slice(&data[source.0..source.0 + source.1]);
        }
        writer.write_all(&payload)?;
    } else {
        writer.write_all(&data[..size])?;
    }

    writer.flush()
}

/// Header, payload offset and payload size of a DDS file
fn parse(file: &[u8]) -> ImageLoadResult<(ImageParameters, usize, usize)> {
    if file.len() < MAGIC.len() + HEADER_SIZE || file[..4] != MAGIC {
        return Err(ImageLoadError::CorruptedHeader);
    }

    let header: DdsHeader = bytemuck::pod_read_unaligned(&file[4..4 + HEADER_SIZE]);

    if header.size as usize != HEADER_SIZE || header.pixel_format.size != PIXEL_FORMAT_SIZE {
        return Err(ImageLoadError::CorruptedHeader);
    }

    if header.width == 0 || header.height == 0 {
        return Err(ImageLoadError::CorruptedHeader);
    }

    let levels = if header.flags & DDSD_MIPMAPCOUNT != 0 {
        header.mip_map_count.max(1)
    } else {
        1
    };

    if levels > MAX_LEVELS {
        return Err(ImageLoadError::CorruptedHeader);
    }

    let pixel_format = header.pixel_format;
    let mut data_offset = MAGIC.len() + HEADER_SIZE;

    let (format, dimensions, depth_or_layers) =
        if pixel_format.flags & DDPF_FOURCC != 0 && pixel_format.four_cc == *b"DX10" {
            let end = data_offset + DX10_HEADER_SIZE;
            if file.len() < end {
                return Err(ImageLoadError::CorruptedHeader);
            }

            let dx10: DdsHeaderDx10 = bytemuck::pod_read_unaligned(&file[data_offset..end]);
            data_offset = end;

            let format = format_from_dxgi(dx10.dxgi_format).ok_or(ImageLoadError::UnsupportedFormat)?;
            let array_size = dx10.array_size.max(1);
            let is_cube = dx10.misc_flag & D3D10_RESOURCE_MISC_TEXTURECUBE != 0;

            match dx10.resource_dimension {
                D3D10_RESOURCE_DIMENSION_TEXTURE3D => {
                    (format, ImageDimensions::Dim3D, header.depth.max(1))
                }
                D3D10_RESOURCE_DIMENSION_TEXTURE2D if is_cube => {
                    let dimensions = if array_size > 1 {
                        ImageDimensions::DimCubeArray
                    } else {
                        ImageDimensions::DimCube
                    };
                    let faces = array_size
                        .checked_mul(CUBE_FACES)
                        .ok_or(ImageLoadError::CorruptedHeader)?;
                    (format, dimensions, faces)
                }
                D3D10_RESOURCE_DIMENSION_TEXTURE2D => {
                    let dimensions = if array_size > 1 {
                        ImageDimensions::Dim2DArray
                    } else {
                        ImageDimensions::Dim2D
                    };
                    (format, dimensions, array_size)
                }
                _ => return Err(ImageLoadError::UnsupportedFormat),
            }
        } else {
            let format = format_from_legacy(&pixel_format)?;

            if header.caps2 & DDSCAPS2_VOLUME != 0 {
                (format, ImageDimensions::Dim3D, header.depth.max(1))
            } else if header.caps2 & DDSCAPS2_CUBEMAP != 0 {
                (format, ImageDimensions::DimCube, CUBE_FACES)
            } else {
                (format, ImageDimensions::Dim2D, 1)
            }
        };

    let parameters = ImageParameters::new(
        header.width,
        header.height,
        depth_or_layers,
        levels,
        format,
        dimensions,
    );

    let size = checked_size(&parameters).ok_or(ImageLoadError::CorruptedHeader)?;
    let end = data_offset.checked_add(size).ok_or(ImageLoadError::CorruptedHeader)?;

    if file.len() < end {
        return Err(ImageLoadError::DataTooShort);
    }

    Ok((parameters, data_offset, size))
}

fn checked_size(parameters: &ImageParameters) -> Option<usize> {
    level_slices(parameters).try_fold(0usize, |total, (width, height, slices)| {
        parameters
            .format
            .checked_slice_size(width as usize, height as usize)?
            .checked_mul(slices as usize)?
            .checked_add(total)
    })
}

fn format_from_dxgi(dxgi_format: u32) -> Option<ImageFormat> {
    let format = match dxgi_format {
        DXGI_FORMAT_R8G8B8A8_UNORM | DXGI_FORMAT_R8G8B8A8_UNORM_SRGB => ImageFormat::R8G8B8A8Unorm,
        DXGI_FORMAT_B8G8R8A8_UNORM | DXGI_FORMAT_B8G8R8A8_UNORM_SRGB => ImageFormat::B8G8R8A8Unorm,
        DXGI_FORMAT_BC1_UNORM | DXGI_FORMAT_BC1_UNORM_SRGB => ImageFormat::Bc1RgbaUnorm,
        DXGI_FORMAT_BC2_UNORM | DXGI_FORMAT_BC2_UNORM_SRGB => ImageFormat::Bc2Unorm,
        DXGI_FORMAT_BC3_UNORM | DXGI_FORMAT_BC3_UNORM_SRGB => ImageFormat::Bc3Unorm,
        _ => return None,
    };
    Some(format)
}

fn dxgi_format(format: ImageFormat) -> Option<u32> {
    match format {
        ImageFormat::R8G8B8A8Unorm => Some(DXGI_FORMAT_R8G8B8A8_UNORM),
        ImageFormat::B8G8R8A8Unorm => Some(DXGI_FORMAT_B8G8R8A8_UNORM),
        ImageFormat::Bc1RgbaUnorm => Some(DXGI_FORMAT_BC1_UNORM),
        ImageFormat::Bc2Unorm => Some(DXGI_FORMAT_BC2_UNORM),
        ImageFormat::Bc3Unorm => Some(DXGI_FORMAT_BC3_UNORM),
        _ => None,
    }
}

fn format_from_legacy(pixel_format: &DdsPixelFormat) -> ImageLoadResult<ImageFormat> {
    if pixel_format.flags & DDPF_FOURCC != 0 {
        return match &pixel_format.four_cc {
            b"DXT1" => Ok(ImageFormat::Bc1RgbaUnorm),
            b"DXT2" | b"DXT3" => Ok(ImageFormat::Bc2Unorm),
            b"DXT4" | b"DXT5" => Ok(ImageFormat::Bc3Unorm),
            _ => Err(ImageLoadError::UnsupportedFormat),
        };
    }

    if pixel_format.flags & DDPF_RGB == 0 {
        return Err(ImageLoadError::UnsupportedFormat);
    }

    let masks = (
        pixel_format.rgb_bit_count,
        pixel_format.r_mask,
        pixel_format.g_mask,
        pixel_format.b_mask,
    );

    match masks {
        (32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000) => Ok(ImageFormat::R8G8B8A8Unorm),
        (32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff) => Ok(ImageFormat::B8G8R8A8Unorm),
        (16, 0x001f, 0x07e0, 0xf800) => Ok(ImageFormat::R5G6B5Unorm),
        (16, 0x001f, 0x03e0, 0x7c00) => Ok(ImageFormat::R5G5B5A1Unorm),
        (16, 0x000f, 0x00f0, 0x0f00) => Ok(ImageFormat::R4G4B4A4Unorm),
        _ => Err(ImageLoadError::UnsupportedFormat),
    }
}

fn legacy_pixel_format(format: ImageFormat) -> DdsPixelFormat {
    let mut pixel_format = DdsPixelFormat {
        size: PIXEL_FORMAT_SIZE,
        ..DdsPixelFormat::zeroed()
    };

    let four_cc = match format {
        ImageFormat::Bc1RgbaUnorm => Some(*b"DXT1"),
        ImageFormat::Bc2Unorm => Some(*b"DXT3"),
        ImageFormat::Bc3Unorm => Some(*b"DXT5"),
        _ => None,
    };

    if let Some(four_cc) = four_cc {
        pixel_format.flags = DDPF_FOURCC;
        pixel_format.four_cc = four_cc;
        return pixel_format;
    }

    let (bits, r, g, b, a) = match format {
        ImageFormat::R8G8B8A8Unorm => (32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0xff00_0000),
        ImageFormat::B8G8R8A8Unorm => (32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000),
        ImageFormat::R5G6B5Unorm => (16, 0x001f, 0x07e0, 0xf800, 0),
        ImageFormat::R5G5B5A1Unorm => (16, 0x001f, 0x03e0, 0x7c00, 0x8000),
        _ => (16, 0x000f, 0x00f0, 0x0f00, 0xf000),
    };

    pixel_format.flags = if a != 0 { DDPF_RGB | DDPF_ALPHAPIXELS } else { DDPF_RGB };
    pixel_format.rgb_bit_count = bits;
    pixel_format.r_mask = r;
    pixel_format.g_mask = g;
    pixel_format.b_mask = b;
    pixel_format.a_mask = a;
    pixel_format
}

fn build_header(parameters: &ImageParameters, dx10: bool) -> DdsHeader {
    let format = parameters.format;
    let is_block = matches!(
        format,
        ImageFormat::Bc1RgbaUnorm | ImageFormat::Bc2Unorm | ImageFormat::Bc3Unorm
    );

    let mut header = DdsHeader {
        size: HEADER_SIZE as u32,
        flags: DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_MIPMAPCOUNT,
        height: parameters.height,
        width: parameters.width,
        mip_map_count: parameters.levels,
        caps: DDSCAPS_TEXTURE,
        ..DdsHeader::zeroed()
    };

    if is_block {
        header.flags |= DDSD_LINEARSIZE;
        header.pitch_or_linear_size =
            format.slice_size(parameters.width as usize, parameters.height as usize) as u32;
    } else {
        header.flags |= DDSD_PITCH;
        header.pitch_or_linear_size = format.slice_size(parameters.width as usize, 1) as u32;
    }

    if parameters.levels > 1 {
        header.caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }

    match parameters.dimensions {
        ImageDimensions::Dim3D => {
            header.flags |= DDSD_DEPTH;
            header.depth = parameters.depth_or_layers;
            header.caps |= DDSCAPS_COMPLEX;
            header.caps2 |= DDSCAPS2_VOLUME;
        }
        ImageDimensions::DimCube | ImageDimensions::DimCubeArray => {
            header.caps |= DDSCAPS_COMPLEX;
            header.caps2 |= DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALL_FACES;
        }
        ImageDimensions::Dim2DArray => header.caps |= DDSCAPS_COMPLEX,
        ImageDimensions::Dim2D => {}
    }

    header.pixel_format = if dx10 {
        DdsPixelFormat {
            size: PIXEL_FORMAT_SIZE,
            flags: DDPF_FOURCC,
            four_cc: *b"DX10",
            ..DdsPixelFormat::zeroed()
        }
    } else {
        legacy_pixel_format(format)
    };

    header
}

fn build_dx10_header(parameters: &ImageParameters, dxgi_format: u32) -> DdsHeaderDx10 {
    let is_cube = matches!(
        parameters.dimensions,
        ImageDimensions::DimCube | ImageDimensions::DimCubeArray
    );

    let array_size = if is_cube {
        (parameters.depth_or_layers / CUBE_FACES).max(1)
    } else {
        parameters.depth_or_layers.max(1)
    };

    DdsHeaderDx10 {
        dxgi_format,
        resource_dimension: D3D10_RESOURCE_DIMENSION_TEXTURE2D,
        misc_flag: if is_cube { D3D10_RESOURCE_MISC_TEXTURECUBE } else { 0 },
        array_size,
        misc_flags2: 0,
    }
}

fn needs_dx10(dimensions: ImageDimensions) -> bool {
    matches!(
        dimensions,
        ImageDimensions::Dim2DArray | ImageDimensions::DimCubeArray
    )
}

fn is_layer_major(parameters: &ImageParameters) -> bool {
    parameters.dimensions != ImageDimensions::Dim3D
        && parameters.depth_or_layers > 1
        && parameters.levels > 1
}

/// (width, height, slices) of every level
fn level_slices(parameters: &ImageParameters) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
    (0..parameters.levels).map(move |level| {
        let slices = if parameters.dimensions == ImageDimensions::Dim3D {
            mip_extent(parameters.depth_or_layers, level)
        } else {
            parameters.depth_or_layers.max(1)
        };

        (
            mip_extent(parameters.width, level),
            mip_extent(parameters.height, level),
            slices,
        )
    })
}

/// Pairs of (layer-major offset, (level-major offset, size)) for every slice
fn layer_major_offsets(parameters: &ImageParameters) -> Vec<(usize, (usize, usize))> {
    let levels: Vec<(usize, u32)> = level_slices(parameters)
        .map(|(width, height, slices)| {
            (parameters.format.slice_size(width as usize, height as usize), slices)
        })
        .collect();

    let mut level_offsets = Vec::with_capacity(levels.len());
    let mut offset = 0;
    for (size, slices) in &levels {
        level_offsets.push(offset);
        offset += size * *slices as usize;
    }

    let layer_chain: usize = levels.iter().map(|(size, _)| size).sum();
    let layers = parameters.depth_or_layers.max(1) as usize;

    let mut offsets = Vec::with_capacity(layers * levels.len());
    for layer in 0..layers {
        let mut layer_offset = layer * layer_chain;
        for (level, (size, _)) in levels.iter().enumerate() {
            offsets.push((layer_offset, (level_offsets[level] + layer * size, *size)));
            layer_offset += size;
        }
    }

    offsets
}
