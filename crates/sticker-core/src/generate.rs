//! Boundary to the remote sticker generation service.
//!
//! The core ships no network client. A caller implements
//! [`StickerGenerator`] over whatever transport it has; this module composes
//! the prompt, validates what comes back and tracks which submission is
//! still current.

use std::future::Future;

use image::ImageFormat;
use thiserror::Error;

use crate::decode::{decode_rgba, png_data_uri, DecodeError};
use crate::encode::encode_rgba_png;

/// Appended to every preset prompt.
pub const PROMPT_SUFFIX: &str = ", a sticker of the person from the provided isolated image, \
expressive pose, detailed facial features, transformed into vector art, with a thick white \
die-cut border, on a transparent background";

/// A selectable sticker style.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePreset {
    pub id: u32,
    /// Style description sent to the model
    pub prompt: String,
    /// CSS color used for the style's swatch
    pub preview_color: String,
}

/// The styles offered to the user, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StyleCatalog {
    presets: Vec<StylePreset>,
}

impl StyleCatalog {
    pub fn new(presets: Vec<StylePreset>) -> Self {
        Self { presets }
    }

    pub fn find(&self, id: u32) -> Option<&StylePreset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    /// The style selected when the app starts.
    pub fn first(&self) -> Option<&StylePreset> {
        self.presets.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StylePreset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Full prompt for a preset.
pub fn compose_prompt(preset: &StylePreset) -> String {
    format!("{}{PROMPT_SUFFIX}", preset.prompt)
}

/// One call to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The confirmed editor bitmap (PNG)
    pub image: Vec<u8>,
    pub style_prompt: String,
}

impl GenerationRequest {
    pub fn new(image: Vec<u8>, preset: &StylePreset) -> Self {
        Self {
            image,
            style_prompt: compose_prompt(preset),
        }
    }
}

/// Why a generation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The service answered without an image
    #[error("No content generated")]
    Empty,

    /// The service returned bytes that are not a decodable image
    #[error("Generated image validation failed: {0}")]
    Validation(DecodeError),

    /// Transport or service-side failure
    #[error("Generation service error: {0}")]
    Service(String),
}

/// Calls the remote model.
///
/// Implementations return the raw image bytes of the first image in the
/// response, or an error. They do not need to validate the bytes.
pub trait StickerGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Vec<u8>, GenerationError>>;
}

/// A validated generation result, always PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBitmap {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl GeneratedBitmap {
    pub fn to_data_uri(&self) -> String {
        png_data_uri(&self.png)
    }
}

/// Check a service response before anything is shown or stored.
///
/// Non-PNG payloads are re-encoded so downstream steps can rely on PNG.
pub fn validate_response(bytes: Vec<u8>) -> Result<GeneratedBitmap, GenerationError> {
    if bytes.is_empty() {
        return Err(GenerationError::Empty);
    }

    let rgba = decode_rgba(&bytes).map_err(GenerationError::Validation)?;
    let (width, height) = rgba.dimensions();

    let png = if image::guess_format(&bytes).ok() == Some(ImageFormat::Png) {
        bytes
    } else {
        encode_rgba_png(&rgba).map_err(|e| GenerationError::Service(e.to_string()))?
    };

    Ok(GeneratedBitmap { width, height, png })
}

/// Send `request` and validate the answer.
pub async fn generate_sticker<G: StickerGenerator>(
    generator: &G,
    request: &GenerationRequest,
) -> Result<GeneratedBitmap, GenerationError> {
    let result = generator.generate(request).await.and_then(validate_response);
    if let Err(e) = &result {
        log::error!("sticker generation failed: {e}");
    }
    result
}

/// Identifies one generation submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleId(u64);

impl CycleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Tracks which generation submission is current.
///
/// In-flight requests are not aborted; a response for anything other than
/// the current cycle is simply ignored.
#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    next: u64,
    current: Option<CycleId>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new cycle, superseding any open one.
    pub fn begin(&mut self) -> CycleId {
        self.next += 1;
        let id = CycleId(self.next);
        self.current = Some(id);
        id
    }

    pub fn is_current(&self, id: CycleId) -> bool {
        self.current == Some(id)
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }

    /// Close `id` if it is current. Returns false for stale cycles.
    pub fn complete(&mut self, id: CycleId) -> bool {
        if !self.is_current(id) {
            log::warn!("ignoring response for stale generation cycle {}", id.0);
            return false;
        }
        self.current = None;
        true
    }

    /// Drop the open cycle so its response will be ignored.
    pub fn abandon(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::{encode_as, solid_rgba};
    use futures::executor::block_on;

    /// Generator answering every request with a fixed result.
    pub(crate) struct FixedGenerator(pub Result<Vec<u8>, GenerationError>);

    impl StickerGenerator for FixedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<Vec<u8>, GenerationError> {
            self.0.clone()
        }
    }

    pub(crate) fn preset(id: u32) -> StylePreset {
        StylePreset {
            id,
            prompt: format!("style {id}"),
            preview_color: "#ff00ff".to_string(),
        }
    }

    #[test]
    fn test_compose_prompt() {
        let prompt = compose_prompt(&StylePreset {
            id: 1,
            prompt: "Chibi anime style".to_string(),
            preview_color: "#fff".to_string(),
        });
        assert!(prompt.starts_with("Chibi anime style, a sticker of the person"));
        assert!(prompt.ends_with("on a transparent background"));
        assert!(prompt.contains("thick white die-cut border"));
    }

    #[test]
    fn test_catalog_find() {
        let catalog = StyleCatalog::new(vec![preset(1), preset(4)]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.first().map(|p| p.id), Some(1));
        assert_eq!(catalog.find(4).map(|p| p.prompt.as_str()), Some("style 4"));
        assert!(catalog.find(2).is_none());
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = r##"[{"id": 3, "prompt": "Pixel art", "previewColor": "#123456"}]"##;
        let catalog: StyleCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.find(3).unwrap().preview_color, "#123456");
    }

    #[test]
    fn test_validate_empty() {
        assert_eq!(validate_response(Vec::new()), Err(GenerationError::Empty));
    }

    #[test]
    fn test_validate_garbage() {
        let result = validate_response(b"<html>quota exceeded</html>".to_vec());
        assert!(matches!(result, Err(GenerationError::Validation(_))));
    }

    #[test]
    fn test_validate_png_kept_verbatim() {
        let png = encode_as(&solid_rgba(5, 4, [1, 2, 3, 255]), ImageFormat::Png);
        let bitmap = validate_response(png.clone()).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (5, 4));
        assert_eq!(bitmap.png, png);
    }

    #[test]
    fn test_validate_jpeg_reencoded_as_png() {
        let jpeg = encode_as(&solid_rgba(8, 8, [90, 90, 90, 255]), ImageFormat::Jpeg);
        let bitmap = validate_response(jpeg).unwrap();
        assert_eq!(image::guess_format(&bitmap.png).unwrap(), ImageFormat::Png);
        assert!(bitmap.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_generate_sticker_success() {
        let png = encode_as(&solid_rgba(2, 2, [0, 0, 0, 255]), ImageFormat::Png);
        let generator = FixedGenerator(Ok(png));
        let request = GenerationRequest::new(vec![1, 2, 3], &preset(1));

        let bitmap = block_on(generate_sticker(&generator, &request)).unwrap();
        assert_eq!(bitmap.width, 2);
    }

    #[test]
    fn test_generate_sticker_service_error() {
        let generator = FixedGenerator(Err(GenerationError::Service("timeout".to_string())));
        let request = GenerationRequest::new(vec![1], &preset(1));

        let result = block_on(generate_sticker(&generator, &request));
        assert_eq!(result, Err(GenerationError::Service("timeout".to_string())));
    }

    #[test]
    fn test_tracker_ignores_stale_cycle() {
        let mut tracker = GenerationTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert!(!tracker.complete(first));
        assert!(tracker.is_pending());
        assert!(tracker.complete(second));
        assert!(!tracker.is_pending());
        // Completing twice is stale too
        assert!(!tracker.complete(second));
    }

    #[test]
    fn test_tracker_abandon() {
        let mut tracker = GenerationTracker::new();
        let cycle = tracker.begin();
        tracker.abandon();
        assert!(!tracker.is_current(cycle));
        assert!(!tracker.complete(cycle));
    }
}
