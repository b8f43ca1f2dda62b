//! Alpha matting ("magic wand").
//!
//! Clears near-white pixels so the white paper around a generated sticker
//! becomes transparent. Each pixel is classified on its own: no flood fill,
//! no edge softening.
//!
//! # Algorithm
//! For every pixel, if `r > t && g > t && b > t` (default `t = 240`) the
//! alpha channel is set to 0. Color channels are never touched, so running
//! the wand twice gives the same result as running it once.

use image::RgbaImage;
use thiserror::Error;

use crate::decode::{decode_rgba, DecodeError};
use crate::encode::{encode_rgba_png, EncodeError};
use crate::MatteConfig;

/// Errors from [`matte_encoded`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatteError {
    /// The input bytes are not a decodable image. The caller's bitmap is
    /// still valid.
    #[error("Cannot matte image: {0}")]
    UnsupportedSource(#[from] DecodeError),

    /// The matted pixels could not be encoded
    #[error("Cannot encode matted image: {0}")]
    Encode(#[from] EncodeError),
}

/// Whether a pixel is bright enough to be cleared.
#[inline]
pub fn is_near_white(pixel: [u8; 4], threshold: u8) -> bool {
    pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold
}

/// Matte with the default threshold, returning a fresh buffer.
pub fn matte(image: &RgbaImage) -> RgbaImage {
    matte_with(image, &MatteConfig::default())
}

/// Matte with an explicit configuration, returning a fresh buffer.
pub fn matte_with(image: &RgbaImage, config: &MatteConfig) -> RgbaImage {
    let mut out = image.clone();
    matte_in_place(&mut out, config);
    out
}

/// Matte `image` in place. Returns the number of pixels newly cleared.
pub fn matte_in_place(image: &mut RgbaImage, config: &MatteConfig) -> u64 {
    let mut cleared = 0u64;
    for pixel in image.pixels_mut() {
        if pixel.0[3] != 0 && is_near_white(pixel.0, config.threshold) {
            pixel.0[3] = 0;
            cleared += 1;
        }
    }
    cleared
}

/// Decode, matte and re-encode as PNG.
///
/// This is the magic wand as the UI invokes it on a stored result.
pub fn matte_encoded(bytes: &[u8], config: &MatteConfig) -> Result<Vec<u8>, MatteError> {
    let mut image = decode_rgba(bytes)?;
    let cleared = matte_in_place(&mut image, config);
    log::debug!(
        "magic wand cleared {cleared} of {} pixels",
        image.width() as u64 * image.height() as u64
    );
    Ok(encode_rgba_png(&image)?)
}
