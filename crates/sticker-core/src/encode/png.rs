//! PNG encoding for confirmed edits, matted stickers and downloads.
//!
//! Every bitmap that leaves the core is PNG: lossless, and it keeps the alpha
//! channel the matting step depends on.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use thiserror::Error;

/// Errors that can occur during PNG encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode straight RGBA8 pixel data to PNG bytes.
///
/// The encoder settings are fixed, so identical pixels always produce
/// identical bytes.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buffer,
        CompressionType::Default,
        FilterType::Adaptive,
    );

    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgba8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

/// Encode an `RgbaImage` to PNG bytes.
pub fn encode_rgba_png(image: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    encode_png(image.as_raw(), image.width(), image.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_basic() {
        let pixels = vec![128u8; 10 * 10 * 4];
        let png = encode_png(&pixels, 10, 10).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_encode_png_is_lossless() {
        let pixels: Vec<u8> = (0..(7 * 5 * 4)).map(|i| (i * 7 % 256) as u8).collect();
        let png = encode_png(&pixels, 7, 5).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.as_raw(), &pixels);
    }

    #[test]
    fn test_encode_png_deterministic() {
        let pixels = vec![42u8; 20 * 20 * 4];
        assert_eq!(
            encode_png(&pixels, 20, 20).unwrap(),
            encode_png(&pixels, 20, 20).unwrap()
        );
    }

    #[test]
    fn test_encode_png_invalid_dimensions() {
        let result = encode_png(&[], 0, 10);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_encode_png_invalid_pixel_data() {
        let pixels = vec![0u8; 10 * 10 * 3];
        let result = encode_png(&pixels, 10, 10);
        assert!(matches!(
            result,
            Err(EncodeError::InvalidPixelData {
                expected: 400,
                actual: 300
            })
        ));
    }

    #[test]
    fn test_encode_rgba_png() {
        let img = RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 0]));
        let png = encode_rgba_png(&img).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(2, 2).0, [1, 2, 3, 0]);
    }
}
