//! Codec bridge
//!
//! Converts native GPU texture data to canonical RGBA8. Pure and stateless,
//! no file system access. Packed formats are expanded here, every block
//! compressed format goes through `texture2ddecoder`.

pub mod error;
pub mod packed;

pub use error::{CodecError, CodecResult};

use crate::format::Format;
use crate::texture::TextureRequest;

/// Conversion seam used by export.
///
/// The storage owns an `Arc<dyn PixelCodec>` so tests can observe or
/// replace the conversions.
pub trait PixelCodec: Send + Sync {
    /// Decode the whole level-major buffer of `request` to RGBA8
    fn decode_to_rgba8(&self, request: &TextureRequest) -> CodecResult<Vec<u8>>;
}

/// Default codec backed by the decoders in this module
#[derive(Debug, Default, Clone, Copy)]
pub struct CodecBridge;

impl PixelCodec for CodecBridge {
    fn decode_to_rgba8(&self, request: &TextureRequest) -> CodecResult<Vec<u8>> {
        convert_to_rgba8(request)
    }
}

/// Decode `request` to level-major RGBA8
pub fn convert_to_rgba8(request: &TextureRequest) -> CodecResult<Vec<u8>> {
    let format = request.format;

    if !format.is_supported() {
        return Err(CodecError::UnsupportedFormat(format));
    }

    let expected: usize = request.native_slices().map(|slice| slice.size).sum();
    if request.data.len() < expected {
        return Err(CodecError::DataTooShort {
            expected,
            actual: request.data.len(),
        });
    }

    let data = &request.data[..expected];

    match format {
        Format::R8G8B8A8Unorm | Format::R8G8B8A8Srgb => Ok(data.to_vec()),
        Format::R5G6B5Unorm | Format::B5G6R5Unorm => Ok(packed::r5g6b5_to_rgba8(data)),
        Format::R5G5B5A1Unorm | Format::B5G5R5A1Unorm => Ok(packed::r5g5b5a1_to_rgba8(data, false)),
        Format::R5G5B5X1Unorm => Ok(packed::r5g5b5a1_to_rgba8(data, true)),
        Format::A1B5G5R5Unorm => Ok(packed::a1b5g5r5_to_rgba8(data)),
        Format::R4G4B4A4Unorm => Ok(packed::r4g4b4a4_to_rgba8(data)),
        _ => decode_blocks(request),
    }
}

/// Decode a block-compressed texture slice by slice
fn decode_blocks(request: &TextureRequest) -> CodecResult<Vec<u8>> {
    let format = request.format;
    let mut output = vec![0u8; request.rgba8_slices().map(|slice| slice.size).sum()];

    for (source, target) in request.native_slices().zip(request.rgba8_slices()) {
        let input = &request.data[source.offset..source.offset + source.size];
        let out = &mut output[target.offset..target.offset + target.size];
        decode_block_slice(format, input, source.width as usize, source.height as usize, out)?;
    }

    Ok(output)
}

fn decode_block_slice(
    format: Format,
    input: &[u8],
    width: usize,
    height: usize,
    output: &mut [u8],
) -> CodecResult<()> {
    let mut pixels = vec![0u32; width * height];

    let result = match format {
        // RGBA flavour, c0 <= c1 blocks carry punch-through alpha
        Format::Bc1RgbaUnorm | Format::Bc1RgbaSrgb => {
            texture2ddecoder::decode_bc1a(input, width, height, &mut pixels)
        }
        Format::Bc2Unorm | Format::Bc2Srgb => texture2ddecoder::decode_bc2(input, width, height, &mut pixels),
        Format::Bc3Unorm | Format::Bc3Srgb => texture2ddecoder::decode_bc3(input, width, height, &mut pixels),
        Format::Bc7Unorm | Format::Bc7Srgb => texture2ddecoder::decode_bc7(input, width, height, &mut pixels),
        Format::Etc2RgbUnorm | Format::Etc2RgbSrgb => {
            texture2ddecoder::decode_etc2_rgb(input, width, height, &mut pixels)
        }
        Format::Etc2RgbPtaUnorm | Format::Etc2RgbPtaSrgb => {
            texture2ddecoder::decode_etc2_rgba1(input, width, height, &mut pixels)
        }
        Format::Etc2RgbaUnorm | Format::Etc2RgbaSrgb => {
            texture2ddecoder::decode_etc2_rgba8(input, width, height, &mut pixels)
        }
        _ => match format.astc_block_size() {
            Some((block_width, block_height)) => {
                texture2ddecoder::decode_astc(input, width, height, block_width, block_height, &mut pixels)
            }
            None => return Err(CodecError::UnsupportedFormat(format)),
        },
    };

    result.map_err(|reason| CodecError::Decode {
        format,
        reason: reason.to_string(),
    })?;

    store_bgra_pixels(&pixels, output);
    Ok(())
}

/// `texture2ddecoder` packs pixels as little-endian BGRA words
fn store_bgra_pixels(pixels: &[u32], output: &mut [u8]) {
    for (pixel, out) in pixels.iter().zip(output.chunks_exact_mut(4)) {
        let [b, g, r, a] = pixel.to_le_bytes();
        out.copy_from_slice(&[r, g, b, a]);
    }
}
