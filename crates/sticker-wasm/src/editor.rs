//! Editing session WASM bindings.
//!
//! [`JsEditSession`] wraps a core `EditSession` for the canvas editor. Loads
//! return a `Promise`; a load that is overtaken by `cancel()` or a newer
//! `load()` resolves to `false` and never touches the session.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsEditSession(undefined);
//! if (await session.load(new Uint8Array(await file.arrayBuffer()))) {
//!   session.set_scale(1.5);
//!   session.rotate(90);
//!   const frame = session.preview();
//!   ctx.putImageData(new ImageData(new Uint8ClampedArray(frame.pixels()), frame.width), 0, 0);
//! }
//! const png = session.confirm();
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use sticker_core::decode::decode_data_uri;
use sticker_core::session::{EditSession, LoadOutcome};
use sticker_core::transform::RotateDirection;
use sticker_core::{CompositorConfig, Point};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

use crate::types::{JsBitmap, JsPngImage};

/// The crop/rotate/zoom editor state.
#[wasm_bindgen]
pub struct JsEditSession {
    inner: Rc<RefCell<EditSession>>,
}

#[wasm_bindgen]
impl JsEditSession {
    /// Create a session. `config` is a partial `CompositorConfig` object
    /// (camelCase keys) or `undefined` for the stock editor.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditSession, JsValue> {
        let config: CompositorConfig = if config.is_undefined() || config.is_null() {
            CompositorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid editor config: {e}")))?
        };
        Self::checked(config).map_err(|e| JsValue::from_str(&e))
    }

    /// Decode an upload. Resolves to `true` when it became the session's
    /// image, `false` when a newer load or a cancel overtook it, and rejects
    /// when the bytes cannot be decoded.
    pub fn load(&self, bytes: Vec<u8>) -> Promise {
        let session = Rc::clone(&self.inner);
        let ticket = session.borrow_mut().begin_load();

        future_to_promise(async move {
            // Let a cancel queued in the same task run before decoding
            JsFuture::from(Promise::resolve(&JsValue::UNDEFINED)).await?;

            let Some(result) = ticket.decode(&bytes).await else {
                return Ok(JsValue::FALSE);
            };
            let outcome = session
                .borrow_mut()
                .finish_load(&ticket, result)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(JsValue::from_bool(outcome == LoadOutcome::Applied))
        })
    }

    /// Like `load`, for a `data:image/...;base64,` URI from a `FileReader`.
    pub fn load_data_uri(&self, uri: &str) -> Result<Promise, JsValue> {
        let bytes = decode_data_uri(uri).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(self.load(bytes))
    }

    #[wasm_bindgen(getter)]
    pub fn is_loaded(&self) -> bool {
        self.inner.borrow().is_loaded()
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.borrow().state().scale()
    }

    /// Rotation in degrees, one of 0, 90, 180, 270.
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> i32 {
        self.inner.borrow().state().rotation_degrees()
    }

    /// Set the zoom. Values outside `[0.5, 3.0]` are clamped.
    pub fn set_scale(&self, value: f64) {
        self.inner.borrow_mut().set_scale(value);
    }

    /// Rotate by `degrees`, which must be `90` or `-90`.
    pub fn rotate(&self, degrees: i32) -> Result<(), JsValue> {
        let direction = RotateDirection::try_from(degrees)
            .map_err(|d| JsValue::from_str(&format!("Rotation must be 90 or -90, got {d}")))?;
        self.inner.borrow_mut().rotate(direction);
        Ok(())
    }

    pub fn begin_drag(&self, x: f64, y: f64) {
        self.inner.borrow_mut().begin_drag(Point::new(x, y));
    }

    pub fn continue_drag(&self, x: f64, y: f64) {
        self.inner.borrow_mut().continue_drag(Point::new(x, y));
    }

    pub fn end_drag(&self) {
        self.inner.borrow_mut().end_drag();
    }

    /// Source-pixel to canvas transform as `[a, b, c, d, e, f]`, ready for
    /// `ctx.setTransform` followed by `ctx.drawImage(img, 0, 0)`. Undefined
    /// when no image is loaded.
    pub fn image_transform(&self) -> Option<Vec<f64>> {
        let surface = self.inner.borrow().render()?;
        let layer = surface.image_layer()?;
        Some(layer.image_to_canvas().as_coeffs().to_vec())
    }

    /// The full editor frame (backdrop, image, guide) as RGBA.
    pub fn preview(&self) -> Option<JsBitmap> {
        self.inner.borrow().preview().map(JsBitmap::from_rgba_image)
    }

    /// Rasterize the edit to PNG and close the session.
    pub fn confirm(&self) -> Result<JsPngImage, JsValue> {
        self.inner
            .borrow_mut()
            .confirm()
            .map(JsPngImage::from)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Discard the image and any load in flight.
    pub fn cancel(&self) {
        self.inner.borrow_mut().cancel();
    }
}

impl JsEditSession {
    /// Build a session from a config that came from JS.
    pub(crate) fn checked(config: CompositorConfig) -> Result<Self, String> {
        config
            .validate()
            .map_err(|e| format!("Invalid editor config: {e}"))?;
        Ok(Self::with_config(config))
    }

    pub(crate) fn with_config(config: CompositorConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EditSession::new(config))),
        }
    }
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// 1x1 PNG.
    const ONE_PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[wasm_bindgen_test]
    async fn test_load_and_confirm() {
        let session = JsEditSession::new(JsValue::UNDEFINED).unwrap();
        let promise = session.load_data_uri(ONE_PIXEL).unwrap();
        let applied = JsFuture::from(promise).await.unwrap();
        assert_eq!(applied.as_bool(), Some(true));
        assert!(session.is_loaded());

        let png = session.confirm().unwrap();
        assert_eq!(png.width(), 400);
        assert!(!session.is_loaded());
    }

    #[wasm_bindgen_test]
    async fn test_cancel_supersedes_pending_load() {
        let session = JsEditSession::new(JsValue::UNDEFINED).unwrap();
        let promise = session.load_data_uri(ONE_PIXEL).unwrap();
        session.cancel();

        let applied = JsFuture::from(promise).await.unwrap();
        assert_eq!(applied.as_bool(), Some(false));
        assert!(!session.is_loaded());
    }

    #[wasm_bindgen_test]
    fn test_rotate_rejects_other_angles() {
        let session = JsEditSession::new(JsValue::UNDEFINED).unwrap();
        assert!(session.rotate(45).is_err());
        assert!(session.rotate(-90).is_ok());
        assert_eq!(session.rotation(), 270);
    }

    #[wasm_bindgen_test]
    fn test_new_rejects_huge_canvas() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(&config, &"canvasSize".into(), &JsValue::from_f64(1e6)).unwrap();
        assert!(JsEditSession::new(config.into()).is_err());
    }

    #[wasm_bindgen_test]
    fn test_confirm_without_image_errors() {
        let session = JsEditSession::new(JsValue::UNDEFINED).unwrap();
        assert!(session.confirm().is_err());
    }
}
