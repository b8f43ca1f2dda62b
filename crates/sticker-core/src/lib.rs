//! Sticker Core - image pipeline for the sticker studio
//!
//! This crate provides the browser-independent parts of the sticker tool:
//! the transform compositor used to crop, rotate and zoom an upload, the
//! alpha matting "magic wand", the generation service contract, the local
//! sticker history and the creation flow that ties them together.

pub mod decode;
pub mod encode;
pub mod flow;
pub mod generate;
pub mod history;
pub mod matte;
pub mod render;
pub mod session;
pub mod transform;

pub use decode::{DecodeError, SourceImage};
pub use encode::EncodeError;
pub use flow::{AppStatus, FlowError, StickerFlow};
pub use generate::{GenerationError, StickerGenerator, StylePreset};
pub use history::{StickerHistory, StickerRecord};
pub use matte::{matte, matte_encoded, MatteError};
pub use render::{rasterize, render_surface, RenderSurface};
pub use session::{EditSession, LoadOutcome, NormalizedBitmap, SessionError};
pub use transform::{RotateDirection, TransformState};

pub use image::RgbaImage;
pub use kurbo::Point;

use thiserror::Error;

/// Largest canvas side a configuration may ask for.
pub const MAX_CANVAS_SIZE: u32 = 4096;

/// A configuration value outside what the compositor can draw.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Canvas size must be between 1 and 4096, got {0}")]
    CanvasSize(u32),

    #[error("Fit ratio must be a positive number, got {0}")]
    FitRatio(f64),

    #[error("Invalid guide geometry: {0}")]
    Guide(&'static str),
}

/// Layout and styling of the editor canvas.
///
/// Defaults reproduce the stock editor: a 400px square, 20px checker tiles,
/// an image fitted to 80% of the canvas and a dashed indigo guide at 45% of
/// the canvas size.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositorConfig {
    /// Side of the square canvas and of the confirmed bitmap, in pixels
    pub canvas_size: u32,
    /// Checkerboard tile side
    pub tile_size: u32,
    /// Fraction of the canvas the fitted image fills (before zoom)
    pub fit_ratio: f64,
    /// Checkerboard base color (RGBA)
    pub checker_base: [u8; 4],
    /// Checkerboard alternate color (RGBA)
    pub checker_alternate: [u8; 4],
    /// Guide radius as a fraction of the canvas size
    pub guide_radius_ratio: f64,
    /// Guide stroke color (RGBA)
    pub guide_color: [u8; 4],
    /// Guide stroke width
    pub guide_line_width: f64,
    /// Guide dash and gap lengths
    pub guide_dash: [f64; 2],
    /// Keep the checkerboard in the confirmed bitmap. When false the area
    /// around the image is transparent
    pub export_backdrop: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_size: 400,
            tile_size: 20,
            fit_ratio: 0.8,
            checker_base: [0xf0, 0xf0, 0xf0, 0xff],
            checker_alternate: [0xdd, 0xdd, 0xdd, 0xff],
            guide_radius_ratio: 0.45,
            guide_color: [0x4f, 0x46, 0xe5, 0xff],
            guide_line_width: 2.0,
            guide_dash: [10.0, 5.0],
            export_backdrop: true,
        }
    }
}

impl CompositorConfig {
    /// Create the stock configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Check values that arrive from outside Rust, such as a JS object.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_size == 0 || self.canvas_size > MAX_CANVAS_SIZE {
            return Err(ConfigError::CanvasSize(self.canvas_size));
        }
        if !self.fit_ratio.is_finite() || self.fit_ratio <= 0.0 {
            return Err(ConfigError::FitRatio(self.fit_ratio));
        }
        if !(self.guide_radius_ratio.is_finite() && self.guide_radius_ratio >= 0.0) {
            return Err(ConfigError::Guide("radius ratio"));
        }
        if !(self.guide_line_width.is_finite() && self.guide_line_width >= 0.0) {
            return Err(ConfigError::Guide("line width"));
        }
        if self.guide_dash.iter().any(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(ConfigError::Guide("dash pattern"));
        }
        Ok(())
    }
}

/// Settings for the magic wand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MatteConfig {
    /// A pixel is cleared when red, green and blue are all strictly above
    /// this value
    pub threshold: u8,
}

impl Default for MatteConfig {
    fn default() -> Self {
        Self { threshold: 240 }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    pub fn encode_as(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let dynamic = DynamicImage::ImageRgba8(img.clone());
        // JPEG has no alpha channel
        let dynamic = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(dynamic.to_rgb8())
        } else {
            dynamic
        };
        let mut out = Cursor::new(Vec::new());
        dynamic.write_to(&mut out, format).unwrap();
        out.into_inner()
    }
}
