//! The editing session behind the crop/rotate/zoom editor.
//!
//! An [`EditSession`] owns the loaded [`SourceImage`], the current
//! [`TransformState`] and any drag in progress. The UI feeds it slider,
//! button and pointer events and asks it for a [`RenderSurface`] to draw.
//! Confirming rasterizes the current view into a [`NormalizedBitmap`] and
//! tears the session down.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --load--> Loaded --confirm--> Idle (bitmap emitted)
//!   ^              |
//!   +----cancel----+
//! ```

mod load;

pub use load::{LoadOutcome, LoadTicket};

use image::RgbaImage;
use kurbo::Point;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::decode::{decode_source, png_data_uri, DecodeError, SourceImage};
use crate::encode::{encode_rgba_png, EncodeError};
use crate::render::{rasterize, render_surface, RenderSurface};
use crate::transform::{DragGesture, RotateDirection, TransformState};
use crate::CompositorConfig;

/// Errors from editing session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Confirm or export called before an image was loaded
    #[error("No image loaded")]
    NoImageLoaded,

    /// The upload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The confirmed bitmap could not be encoded
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// The confirmed editor output: a square PNG of the image layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBitmap {
    /// Side of the square bitmap in pixels
    pub size: u32,
    /// PNG-encoded RGBA pixels
    pub png: Vec<u8>,
}

impl NormalizedBitmap {
    /// The bitmap as a `data:image/png;base64,` URI.
    pub fn to_data_uri(&self) -> String {
        png_data_uri(&self.png)
    }
}

/// State of one editor session.
#[derive(Debug)]
pub struct EditSession {
    config: CompositorConfig,
    source: Option<SourceImage>,
    state: TransformState,
    drag: Option<DragGesture>,
    load_token: CancellationToken,
    generation: u64,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new(CompositorConfig::default())
    }
}

impl EditSession {
    pub fn new(config: CompositorConfig) -> Self {
        Self {
            config,
            source: None,
            state: TransformState::IDENTITY,
            drag: None,
            load_token: CancellationToken::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn state(&self) -> &TransformState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Decode `bytes` and make it the session's image.
    ///
    /// Any load still in flight is superseded. On failure the session is
    /// left idle, with no image.
    pub fn load(&mut self, bytes: &[u8]) -> Result<&SourceImage, SessionError> {
        self.supersede_pending();
        match decode_source(bytes) {
            Ok(image) => Ok(self.install(image)),
            Err(e) => {
                self.clear();
                Err(e.into())
            }
        }
    }

    /// Start an asynchronous load, superseding any load already in flight.
    ///
    /// Decode with [`LoadTicket::decode`], then hand the result to
    /// [`EditSession::finish_load`].
    pub fn begin_load(&mut self) -> LoadTicket {
        self.supersede_pending();
        LoadTicket::new(self.generation, self.load_token.clone())
    }

    /// Apply the result of a load started with [`EditSession::begin_load`].
    ///
    /// Results for tickets that have been cancelled or superseded are
    /// dropped and reported as [`LoadOutcome::Superseded`], even if they are
    /// errors.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<SourceImage, DecodeError>,
    ) -> Result<LoadOutcome, SessionError> {
        if ticket.is_cancelled() || ticket.generation() != self.generation {
            log::warn!(
                "discarding stale load {} (current {})",
                ticket.generation(),
                self.generation
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(image) => {
                self.install(image);
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                self.clear();
                Err(e.into())
            }
        }
    }

    pub fn set_scale(&mut self, value: f64) {
        self.state.set_scale(value);
    }

    pub fn rotate(&mut self, direction: RotateDirection) {
        self.state.rotate(direction);
        log::debug!("rotation now {}", self.state.rotation_degrees());
    }

    /// Pointer down on the canvas.
    pub fn begin_drag(&mut self, pointer: Point) {
        self.drag = Some(DragGesture::begin(pointer, self.state.offset()));
    }

    /// Pointer move. Ignored unless a drag is active.
    pub fn continue_drag(&mut self, pointer: Point) {
        let Some(drag) = self.drag else {
            return;
        };
        let offset = drag.offset_for(pointer, self.state.rotation_degrees(), self.state.scale());
        self.state.set_offset(offset);
    }

    /// Pointer up or leave. Ignored unless a drag is active.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Describe the editor canvas, or `None` when no image is loaded.
    pub fn render(&self) -> Option<RenderSurface> {
        self.source
            .as_ref()
            .map(|source| render_surface(source, &self.state, &self.config))
    }

    /// Rasterize the full editor view, guide included.
    pub fn preview(&self) -> Option<RgbaImage> {
        let surface = self.render()?;
        Some(rasterize(&surface, self.source.as_ref()))
    }

    /// Rasterize what confirming would produce, without ending the session.
    pub fn export(&self) -> Result<RgbaImage, SessionError> {
        let source = self.source.as_ref().ok_or(SessionError::NoImageLoaded)?;
        let surface = render_surface(source, &self.state, &self.config);
        let output = if self.config.export_backdrop {
            surface.without_guide()
        } else {
            surface.image_only()
        };
        Ok(rasterize(&output, Some(source)))
    }

    /// Rasterize the current view to PNG and end the session.
    ///
    /// On error the session is left unchanged.
    pub fn confirm(&mut self) -> Result<NormalizedBitmap, SessionError> {
        let pixels = self.export()?;
        let png = encode_rgba_png(&pixels)?;
        let bitmap = NormalizedBitmap {
            size: pixels.width(),
            png,
        };

        self.supersede_pending();
        self.clear();
        log::debug!("confirmed {0}x{0} bitmap", bitmap.size);
        Ok(bitmap)
    }

    /// Discard the image and transform and drop any load in flight.
    pub fn cancel(&mut self) {
        self.supersede_pending();
        self.clear();
    }

    fn supersede_pending(&mut self) {
        self.load_token.cancel();
        self.load_token = CancellationToken::new();
        self.generation += 1;
    }

    fn install(&mut self, image: SourceImage) -> &SourceImage {
        log::debug!("loaded {}x{} image", image.width(), image.height());
        self.state = TransformState::IDENTITY;
        self.drag = None;
        self.source.insert(image)
    }

    fn clear(&mut self) {
        self.source = None;
        self.state = TransformState::IDENTITY;
        self.drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_as, solid_rgba};
    use futures::executor::block_on;
    use image::{ImageFormat, Rgba};
    use kurbo::Vec2;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        encode_as(&solid_rgba(width, height, color), ImageFormat::Png)
    }

    fn decode_png(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().into_rgba8()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = EditSession::default();
        assert!(!session.is_loaded());
        assert!(session.render().is_none());
        assert!(session.preview().is_none());
    }

    #[test]
    fn test_load_resets_transform() {
        let mut session = EditSession::default();
        session.load(&png(10, 10, [1, 2, 3, 255])).unwrap();
        session.set_scale(2.0);
        session.rotate(RotateDirection::Clockwise);
        session.begin_drag(Point::new(0.0, 0.0));
        session.continue_drag(Point::new(10.0, 10.0));

        session.load(&png(20, 10, [1, 2, 3, 255])).unwrap();
        assert!(session.state().is_identity());
        assert!(!session.is_dragging());
        assert_eq!(session.source().unwrap().width(), 20);
    }

    #[test]
    fn test_load_corrupt_leaves_session_idle() {
        let mut session = EditSession::default();
        session.load(&png(4, 4, [0, 0, 0, 255])).unwrap();

        let result = session.load(b"definitely not an image");
        assert!(matches!(result, Err(SessionError::Decode(_))));
        assert!(!session.is_loaded());
        assert!(session.render().is_none());
    }

    #[test]
    fn test_render_does_not_mutate() {
        let mut session = EditSession::default();
        session.load(&png(30, 20, [9, 9, 9, 255])).unwrap();
        session.set_scale(1.3);

        let before = *session.state();
        let first = session.render().unwrap();
        let second = session.render().unwrap();
        assert_eq!(first, second);
        assert_eq!(*session.state(), before);
    }

    #[test]
    fn test_drag_outside_gesture_ignored() {
        let mut session = EditSession::default();
        session.load(&png(10, 10, [0, 0, 0, 255])).unwrap();

        session.continue_drag(Point::new(50.0, 50.0));
        session.end_drag();
        assert_eq!(session.state().offset(), Vec2::ZERO);
    }

    #[test]
    fn test_drag_updates_offset() {
        let mut session = EditSession::default();
        session.load(&png(10, 10, [0, 0, 0, 255])).unwrap();
        session.set_scale(2.0);

        session.begin_drag(Point::new(100.0, 100.0));
        session.continue_drag(Point::new(120.0, 110.0));
        assert_eq!(session.state().offset(), Vec2::new(10.0, 5.0));

        // Same pointer again gives the same offset
        session.continue_drag(Point::new(120.0, 110.0));
        assert_eq!(session.state().offset(), Vec2::new(10.0, 5.0));

        session.end_drag();
        session.continue_drag(Point::new(300.0, 300.0));
        assert_eq!(session.state().offset(), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn test_confirm_without_image() {
        let mut session = EditSession::default();
        assert_eq!(session.confirm(), Err(SessionError::NoImageLoaded));
    }

    #[test]
    fn test_confirm_produces_canvas_sized_png_and_tears_down() {
        let mut session = EditSession::default();
        session.load(&png(100, 100, [255, 0, 0, 255])).unwrap();

        let bitmap = session.confirm().unwrap();
        assert_eq!(bitmap.size, 400);
        assert!(bitmap.to_data_uri().starts_with("data:image/png;base64,"));
        assert!(!session.is_loaded());

        let pixels = decode_png(&bitmap.png);
        assert_eq!(pixels.dimensions(), (400, 400));
        // Fitted red square in the middle, checkerboard around it
        assert_eq!(pixels.get_pixel(200, 200).0, [255, 0, 0, 255]);
        assert_eq!(pixels.get_pixel(5, 5).0, session.config().checker_alternate);
        assert_eq!(pixels.get_pixel(25, 5).0, session.config().checker_base);
    }

    #[test]
    fn test_confirm_excludes_guide() {
        // A white image larger than the guide circle
        let mut session = EditSession::default();
        session.load(&png(100, 100, [255, 255, 255, 255])).unwrap();
        session.set_scale(1.5);

        let preview = session.preview().unwrap();
        let guide = session.config().guide_color;
        assert_eq!(preview.get_pixel(379, 200).0, guide);

        let exported = session.export().unwrap();
        assert!(!exported.pixels().any(|p| p.0 == guide));
    }

    fn transparent_export() -> CompositorConfig {
        CompositorConfig {
            export_backdrop: false,
            ..CompositorConfig::default()
        }
    }

    #[test]
    fn test_transparent_export() {
        let mut session = EditSession::new(transparent_export());
        session.load(&png(10, 10, [0, 0, 0, 255])).unwrap();

        let exported = session.export().unwrap();
        assert_eq!(exported.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(exported.get_pixel(200, 200).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_export_twice_is_identical() {
        let mut session = EditSession::default();
        session.load(&png(30, 50, [200, 100, 0, 255])).unwrap();
        session.rotate(RotateDirection::Clockwise);
        session.set_scale(0.8);

        let first = encode_rgba_png(&session.export().unwrap()).unwrap();
        let second = encode_rgba_png(&session.export().unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_confirm_is_deterministic() {
        let bytes = png(40, 30, [12, 34, 56, 255]);
        let run = || {
            let mut session = EditSession::default();
            session.load(&bytes).unwrap();
            session.set_scale(1.7);
            session.rotate(RotateDirection::CounterClockwise);
            session.begin_drag(Point::new(10.0, 10.0));
            session.continue_drag(Point::new(25.0, -5.0));
            session.confirm().unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_identity_export_matches_fit_geometry() {
        let mut img = solid_rgba(2, 1, [255, 0, 0, 255]);
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));
        let mut session = EditSession::new(transparent_export());
        session.load(&encode_as(&img, ImageFormat::Png)).unwrap();

        // 2x1 fits as 320x160 centered: x in [40, 360), y in [120, 280)
        let out = session.export().unwrap();
        assert_eq!(out.get_pixel(50, 200).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(350, 200).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(200, 110).0[3], 0);
        assert_eq!(out.get_pixel(200, 290).0[3], 0);
    }

    #[test]
    fn test_cancel_then_load_again() {
        let mut session = EditSession::default();
        session.load(&png(10, 10, [255, 0, 0, 255])).unwrap();
        session.set_scale(2.5);
        session.cancel();
        assert!(!session.is_loaded());
        assert!(session.state().is_identity());

        let green = [0, 200, 0, 255];
        session.load(&png(12, 8, green)).unwrap();
        assert_eq!(session.source().unwrap().width(), 12);

        let bitmap = session.confirm().unwrap();
        let out = decode_png(&bitmap.png);
        assert_eq!(out.dimensions(), (400, 400));
        assert_eq!(out.get_pixel(200, 200).0, green);
        // 12x8 fits as 320x213 at identity; the old 2.5x zoom would cover row 80
        assert_ne!(out.get_pixel(200, 80).0, green);
        assert!(out.pixels().all(|p| p.0 != [255, 0, 0, 255]));
    }

    #[test]
    fn test_async_load_applies() {
        let mut session = EditSession::default();
        let ticket = session.begin_load();
        let bytes = png(5, 5, [0, 0, 0, 255]);

        let result = block_on(ticket.decode(&bytes)).unwrap();
        assert_eq!(session.finish_load(&ticket, result), Ok(LoadOutcome::Applied));
        assert!(session.is_loaded());
    }

    #[test]
    fn test_stale_load_discarded_after_newer_load() {
        let mut session = EditSession::default();
        let first = session.begin_load();
        let second = session.begin_load();

        let slow = block_on(second.decode(&png(7, 7, [0, 0, 0, 255]))).unwrap();
        assert_eq!(session.finish_load(&second, slow), Ok(LoadOutcome::Applied));

        // The first ticket was cancelled when the second load began
        assert!(first.is_cancelled());
        let late = decode_source(&png(3, 3, [0, 0, 0, 255]));
        assert_eq!(session.finish_load(&first, late), Ok(LoadOutcome::Superseded));
        assert_eq!(session.source().unwrap().width(), 7);
    }

    #[test]
    fn test_stale_load_discarded_after_cancel() {
        let mut session = EditSession::default();
        let ticket = session.begin_load();
        session.cancel();

        let bytes = png(5, 5, [0, 0, 0, 255]);
        assert!(block_on(ticket.decode(&bytes)).is_none());

        let result = decode_source(&bytes);
        assert_eq!(session.finish_load(&ticket, result), Ok(LoadOutcome::Superseded));
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_stale_error_does_not_clear_current_image() {
        let mut session = EditSession::default();
        let stale = session.begin_load();
        session.load(&png(6, 6, [0, 0, 0, 255])).unwrap();

        let outcome = session.finish_load(&stale, Err(DecodeError::InvalidFormat));
        assert_eq!(outcome, Ok(LoadOutcome::Superseded));
        assert!(session.is_loaded());
    }
}
