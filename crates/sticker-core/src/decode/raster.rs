//! Raster decoding for uploads and generated results.
//!
//! Uploads may be PNG, JPEG or WebP. JPEG EXIF orientation is applied so the
//! decoded pixels match what the browser shows in its file preview.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, RgbaImage};

use super::{DecodeError, Orientation, SourceImage};

/// Formats accepted by the editor's file picker.
pub const SUPPORTED_FORMATS: [ImageFormat; 3] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// Decode an upload into a `SourceImage`.
///
/// # Errors
///
/// Returns `DecodeError::Empty` for zero bytes, `DecodeError::InvalidFormat`
/// when the format cannot be sniffed, `DecodeError::UnsupportedFormat` for
/// recognised formats outside [`SUPPORTED_FORMATS`], and
/// `DecodeError::CorruptedFile` when decoding fails.
pub fn decode_source(bytes: &[u8]) -> Result<SourceImage, DecodeError> {
    let rgba = decode_rgba(bytes)?;
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(DecodeError::CorruptedFile("image has no pixels".to_string()));
    }
    log::debug!("decoded source image {}x{}", rgba.width(), rgba.height());
    Ok(SourceImage::from_rgba_image(rgba))
}

/// Decode any supported raster into straight RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    let format = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    if !SUPPORTED_FORMATS.contains(&format) {
        return Err(DecodeError::UnsupportedFormat(format!("{format:?}")));
    }

    let orientation = if format == ImageFormat::Jpeg {
        extract_orientation(bytes)
    } else {
        Orientation::Normal
    };

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(apply_orientation(img, orientation).into_rgba8())
}

/// EXIF orientation of JPEG bytes; `Orientation::Normal` if none is found.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);

    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
