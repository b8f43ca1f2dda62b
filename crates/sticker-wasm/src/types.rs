//! WASM-compatible wrapper types for image data.
//!
//! Raw bitmaps cross the boundary as straight RGBA so JavaScript can wrap
//! them in `ImageData` directly; encoded images cross as PNG bytes.

use sticker_core::decode::png_data_uri;
use sticker_core::generate::GeneratedBitmap;
use sticker_core::session::NormalizedBitmap;
use sticker_core::RgbaImage;
use wasm_bindgen::prelude::*;

/// An RGBA bitmap for JavaScript.
///
/// `pixels()` copies the buffer into a `Uint8ClampedArray`-compatible
/// `Uint8Array` of `width * height * 4` bytes.
#[wasm_bindgen]
pub struct JsBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsBitmap {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data. This is a copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsBitmap {
    pub(crate) fn from_rgba_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }
}

/// A PNG-encoded image for JavaScript.
#[wasm_bindgen]
pub struct JsPngImage {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

#[wasm_bindgen]
impl JsPngImage {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The PNG bytes. This is a copy.
    pub fn bytes(&self) -> Vec<u8> {
        self.png.clone()
    }

    /// The image as a `data:image/png;base64,` URI, ready for an `<img>`.
    pub fn to_data_uri(&self) -> String {
        png_data_uri(&self.png)
    }
}

impl From<NormalizedBitmap> for JsPngImage {
    fn from(bitmap: NormalizedBitmap) -> Self {
        Self {
            width: bitmap.size,
            height: bitmap.size,
            png: bitmap.png,
        }
    }
}

impl From<GeneratedBitmap> for JsPngImage {
    fn from(bitmap: GeneratedBitmap) -> Self {
        Self {
            width: bitmap.width,
            height: bitmap.height,
            png: bitmap.png,
        }
    }
}
