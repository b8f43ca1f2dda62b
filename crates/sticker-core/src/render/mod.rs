//! Editor canvas rendering.
//!
//! Rendering is split in two:
//! - [`render_surface`] builds a [`RenderSurface`], a pure description of the
//!   layers (backdrop, transformed image, crop guide) with their affine
//!   transforms
//! - [`rasterize`] paints a description into RGBA pixels
//!
//! The preview shows every layer. Confirmation rasterizes a filtered surface
//! (see [`RenderSurface::image_only`]) so the guide never reaches the output.

mod rasterize;
mod surface;

pub use rasterize::rasterize;
pub use surface::{
    empty_surface, fit_scale, render_surface, Checkerboard, Color, GuideCircle, ImageLayer, Layer,
    RenderSurface,
};
