//! Generation service helpers for the TypeScript client.
//!
//! The network call itself lives in TypeScript. These bindings build the
//! prompt, unwrap the editor's data URI for the request body and validate
//! the service's answer before it is shown or stored.

use sticker_core::decode::strip_data_uri_prefix;
use sticker_core::generate::{compose_prompt, validate_response, StylePreset};
use wasm_bindgen::prelude::*;

use crate::types::JsPngImage;

/// Full prompt for a style preset object `{ id, prompt, previewColor }`.
#[wasm_bindgen]
pub fn sticker_prompt(preset: JsValue) -> Result<String, JsValue> {
    let preset: StylePreset = serde_wasm_bindgen::from_value(preset)
        .map_err(|e| JsValue::from_str(&format!("Invalid style preset: {e}")))?;
    Ok(compose_prompt(&preset))
}

/// The base64 payload of an image data URI, as sent in the request body.
#[wasm_bindgen]
pub fn data_uri_payload(uri: &str) -> Result<String, JsValue> {
    strip_data_uri_prefix(uri)
        .map(str::to_string)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Check the bytes the service returned. Rejects empty or undecodable
/// payloads; anything else comes back as PNG.
#[wasm_bindgen]
pub fn validate_generated(bytes: Vec<u8>) -> Result<JsPngImage, JsValue> {
    validate_response(bytes)
        .map(JsPngImage::from)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
