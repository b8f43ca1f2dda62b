//! Magic wand WASM bindings.
//!
//! Clears near-white pixels of a generated sticker. All functions return a
//! fresh PNG; on error the caller's image is still valid.

use sticker_core::decode::{decode_data_uri, png_data_uri};
use sticker_core::matte::matte_encoded;
use sticker_core::MatteConfig;
use wasm_bindgen::prelude::*;

/// Matte PNG/JPEG/WebP bytes with the default threshold (240).
#[wasm_bindgen]
pub fn magic_wand(bytes: &[u8]) -> Result<Vec<u8>, JsValue> {
    magic_wand_with_threshold(bytes, MatteConfig::default().threshold)
}

/// Matte with a custom threshold: pixels whose red, green and blue are all
/// strictly above `threshold` become transparent.
#[wasm_bindgen]
pub fn magic_wand_with_threshold(bytes: &[u8], threshold: u8) -> Result<Vec<u8>, JsValue> {
    matte_encoded(bytes, &MatteConfig { threshold }).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Matte an image given as a data URI, returning a PNG data URI.
#[wasm_bindgen]
pub fn magic_wand_data_uri(uri: &str) -> Result<String, JsValue> {
    let bytes = decode_data_uri(uri).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let png = magic_wand(&bytes)?;
    Ok(png_data_uri(&png))
}

#[cfg(test)]
mod tests {
    use sticker_core::matte::matte_encoded;
    use sticker_core::MatteConfig;

    // Error paths build a JsValue, so only the success path runs natively
    #[test]
    fn test_default_threshold_matches_core() {
        assert_eq!(MatteConfig::default().threshold, 240);
        assert!(matte_encoded(b"", &MatteConfig::default()).is_err());
    }
}
