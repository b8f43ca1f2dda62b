//! Sticker WASM - WebAssembly bindings for the sticker studio
//!
//! This crate exposes the sticker-core pipeline to the TypeScript UI.
//!
//! # Module Structure
//!
//! - `editor` - Crop/rotate/zoom editing session with cancellable loads
//! - `matte` - Magic wand (near-white to transparent)
//! - `generate` - Prompt building and response validation for the service call
//! - `history` - Sticker history list and download names
//! - `types` - WASM-compatible wrapper types for image data
//! - `logger` - `log` records forwarded to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditSession, magic_wand } from '@sticker/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsEditSession(undefined);
//! await session.load(new Uint8Array(await file.arrayBuffer()));
//! const confirmed = session.confirm();
//! ```

use log::LevelFilter;
use wasm_bindgen::prelude::*;

mod editor;
mod generate;
mod history;
mod logger;
mod matte;
mod types;

// Re-export public types
pub use editor::JsEditSession;
pub use generate::{data_uri_payload, sticker_prompt, validate_generated};
pub use history::{result_download_filename, JsStickerHistory};
pub use logger::set_log_level;
pub use matte::{magic_wand, magic_wand_data_uri, magic_wand_with_threshold};
pub use types::{JsBitmap, JsPngImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::init(LevelFilter::Info);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
