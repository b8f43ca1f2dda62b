//! Core types for image decoding.

use image::RgbaImage;
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("Empty image data")]
    Empty,

    /// The bytes do not look like any known raster format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The format was recognised but the editor does not accept it.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// A data URI was malformed or its payload was not valid base64.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded upload, ready for the editor.
///
/// Pixels are straight (non-premultiplied) RGBA8 in row-major order. The
/// buffer is never mutated after decode; the compositor only samples it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    image: RgbaImage,
}

impl SourceImage {
    /// Create a SourceImage from raw RGBA bytes.
    ///
    /// Returns `None` if the buffer length does not match `width * height * 4`
    /// or either dimension is zero.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        RgbaImage::from_raw(width, height, pixels).map(Self::from_rgba_image)
    }

    /// Wrap an already decoded `RgbaImage`.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying RGBA buffer.
    pub fn as_rgba_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Read one pixel. Coordinates must be in bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_source_image_from_raw() {
        let img = SourceImage::from_raw(4, 2, vec![7u8; 4 * 2 * 4]).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 2);
        assert_eq!(img.pixel_count(), 8);
        assert_eq!(img.pixel(3, 1), [7, 7, 7, 7]);
    }

    #[test]
    fn test_source_image_rejects_bad_buffer() {
        assert!(SourceImage::from_raw(4, 4, vec![0u8; 10]).is_none());
        assert!(SourceImage::from_raw(0, 4, vec![]).is_none());
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::UnsupportedFormat("Gif".to_string());
        assert_eq!(err.to_string(), "Unsupported image format: Gif");

        let err = DecodeError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
