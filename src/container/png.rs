//! PNG container, one RGBA8 slice per file

use std::io::{self, Cursor, Write};

use image::codecs::png::{CompressionType, FilterType, PngDecoder, PngEncoder};
use image::{ColorType, DynamicImage, ImageDecoder, ImageEncoder, ImageError};

use super::{ImageLoadError, ImageLoadResult, ImageParameters};

/// Read the dimensions of a PNG file
pub fn load_header(file: &[u8]) -> ImageLoadResult<ImageParameters> {
    let decoder = PngDecoder::new(Cursor::new(file)).map_err(header_error)?;
    let (width, height) = decoder.dimensions();

    if width == 0 || height == 0 {
        return Err(ImageLoadError::CorruptedHeader);
    }

    Ok(ImageParameters::rgba8_2d(width, height))
}

/// Decode a PNG file into `output` as tightly packed RGBA8
pub fn load_data(file: &[u8], output: &mut [u8]) -> ImageLoadResult<()> {
    let decoder = PngDecoder::new(Cursor::new(file)).map_err(header_error)?;
    let image = DynamicImage::from_decoder(decoder).map_err(data_error)?.to_rgba8();
    let pixels = image.as_raw();

    if output.len() < pixels.len() {
        return Err(ImageLoadError::OutputTooShort);
    }

    output[..pixels.len()].copy_from_slice(pixels);
    Ok(())
}

/// Encode one RGBA8 slice with fast compression
pub fn save<W: Write>(writer: W, width: u32, height: u32, data: &[u8]) -> io::Result<()> {
    let size = width as usize * height as usize * 4;

    if data.len() < size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("slice data is {} bytes, {} required", data.len(), size),
        ));
    }

    PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::Adaptive)
        .write_image(&data[..size], width, height, ColorType::Rgba8)
        .map_err(|error| match error {
            ImageError::IoError(error) => error,
            other => io::Error::new(io::ErrorKind::Other, other),
        })
}

fn header_error(error: ImageError) -> ImageLoadError {
    match error {
        ImageError::Unsupported(_) => ImageLoadError::UnsupportedFormat,
        ImageError::IoError(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
            ImageLoadError::DataTooShort
        }
        _ => ImageLoadError::CorruptedHeader,
    }
}

fn data_error(error: ImageError) -> ImageLoadError {
    match error {
        ImageError::Unsupported(_) => ImageLoadError::UnsupportedFormat,
        ImageError::IoError(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
            ImageLoadError::DataTooShort
        }
        _ => ImageLoadError::CorruptedData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, data: &[u8]) -> Vec<u8> {
        let mut file = Vec::new();
        save(&mut file, width, height, data).expect("encode png");
        file
    }

    #[test]
    fn test_round_trip_preserves_pixels() {
        let data: Vec<u8> = (0..3 * 2 * 4).map(|i| (i * 7) as u8).collect();
        let file = encode(3, 2, &data);

        let header = load_header(&file).expect("header");
        assert_eq!(header, ImageParameters::rgba8_2d(3, 2));

        let mut output = vec![0u8; data.len()];
        load_data(&file, &mut output).expect("data");
        assert_eq!(output, data);
    }

    #[test]
    fn test_small_output_is_rejected() {
        let file = encode(2, 2, &[0u8; 16]);
        let mut output = vec![0u8; 8];
        assert_eq!(load_data(&file, &mut output), Err(ImageLoadError::OutputTooShort));
    }

    #[test]
    fn test_garbage_is_not_a_png() {
        assert!(load_header(b"definitely not a png").is_err());
    }

    #[test]
    fn test_short_input_is_rejected() {
        let mut file = Vec::new();
        assert!(save(&mut file, 4, 4, &[0u8; 10]).is_err());
    }
}
