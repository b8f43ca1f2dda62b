//! Sticker history WASM bindings.
//!
//! The TypeScript side reads and writes `localStorage`; this wrapper keeps
//! the list semantics and JSON format in one place.
//!
//! ```typescript
//! const history = JsStickerHistory.restore(localStorage.getItem(JsStickerHistory.storage_key()));
//! history.add(dataUri, style.id, Date.now());
//! localStorage.setItem(JsStickerHistory.storage_key(), history.to_json());
//! ```

use sticker_core::history::{result_filename, StickerHistory, HISTORY_KEY};
use wasm_bindgen::prelude::*;

/// Newest-first list of generated stickers.
#[wasm_bindgen]
pub struct JsStickerHistory {
    inner: StickerHistory,
}

#[wasm_bindgen]
impl JsStickerHistory {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsStickerHistory {
        Self {
            inner: StickerHistory::new(),
        }
    }

    /// Restore from the stored JSON. Missing or corrupt data gives an empty
    /// history (the problem is logged).
    pub fn restore(stored: Option<String>) -> JsStickerHistory {
        Self {
            inner: StickerHistory::load_or_empty(stored.as_deref()),
        }
    }

    /// The `localStorage` key the history lives under.
    pub fn storage_key() -> String {
        HISTORY_KEY.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Add a sticker and return its id.
    pub fn add(&mut self, image_data_uri: String, style_id: u32, timestamp: f64) -> Result<String, JsValue> {
        let timestamp = millis(timestamp)?;
        Ok(self.inner.add(image_data_uri, style_id, timestamp).id.clone())
    }

    /// Remove a sticker. Returns whether it existed.
    pub fn delete(&mut self, id: &str) -> bool {
        self.inner.delete(id)
    }

    /// The records as an array of plain objects.
    pub fn records(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.records())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, JsValue> {
        self.inner.to_json().map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Download name for a history entry, if the id exists.
    pub fn download_filename(&self, id: &str) -> Option<String> {
        self.inner.get(id).map(|record| record.download_filename())
    }
}

impl Default for JsStickerHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Download name for a freshly generated sticker.
#[wasm_bindgen]
pub fn result_download_filename(style_id: u32, timestamp: f64) -> Result<String, JsValue> {
    Ok(result_filename(style_id, millis(timestamp)?))
}

/// Convert a JavaScript `Date.now()` value.
fn millis(timestamp: f64) -> Result<u64, JsValue> {
    checked_millis(timestamp)
        .ok_or_else(|| JsValue::from_str(&format!("Invalid timestamp: {timestamp}")))
}

fn checked_millis(timestamp: f64) -> Option<u64> {
    (timestamp.is_finite() && timestamp >= 0.0).then_some(timestamp as u64)
}
