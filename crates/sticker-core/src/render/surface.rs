//! Render description: the layers the editor canvas shows for one frame.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::decode::SourceImage;
use crate::transform::TransformState;
use crate::CompositorConfig;

/// Straight RGBA8 color.
pub type Color = [u8; 4];

/// Alternating square tiles standing in for transparency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkerboard {
    /// Tile side in canvas units.
    pub tile_size: u32,
    /// Color of tiles where `(⌊x/T⌋ + ⌊y/T⌋)` is odd.
    pub base: Color,
    /// Color of tiles where `(⌊x/T⌋ + ⌊y/T⌋)` is even.
    pub alternate: Color,
}

impl Checkerboard {
    /// Color of the tile containing canvas pixel `(x, y)`.
    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        let tile = self.tile_size.max(1);
        if (x / tile + y / tile) % 2 == 0 {
            self.alternate
        } else {
            self.base
        }
    }
}

/// The source image placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayer {
    /// Source dimensions in pixels.
    pub source_width: u32,
    pub source_height: u32,
    /// Local drawing space to canvas space (center, rotation, zoom, pan).
    pub transform: Affine,
    /// Where the image is drawn in local space, centered on the origin.
    pub dest: Rect,
}

impl ImageLayer {
    /// Map from source pixel coordinates straight to canvas coordinates.
    pub fn image_to_canvas(&self) -> Affine {
        let sx = self.dest.width() / self.source_width as f64;
        let sy = self.dest.height() / self.source_height as f64;
        self.transform
            * Affine::translate(Vec2::new(self.dest.x0, self.dest.y0))
            * Affine::scale_non_uniform(sx, sy)
    }
}

/// The dashed circular crop guide. Decorative; it never clips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideCircle {
    pub center: Point,
    pub radius: f64,
    pub stroke: Color,
    pub line_width: f64,
    /// Dash and gap lengths along the circumference.
    pub dash: [f64; 2],
}

/// One layer of the editor canvas, listed back to front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layer {
    Backdrop(Checkerboard),
    Image(ImageLayer),
    Guide(GuideCircle),
}

/// Everything needed to draw one editor frame.
///
/// Produced by [`render_surface`]; consumed by a rasterizer. It holds no
/// pixel data, so it is cheap to build on every animation frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    /// Side of the square canvas in pixels.
    pub size: u32,
    /// Layers in back-to-front order.
    pub layers: Vec<Layer>,
}

impl RenderSurface {
    /// The image layer, if one is present.
    pub fn image_layer(&self) -> Option<&ImageLayer> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Image(image) => Some(image),
            _ => None,
        })
    }

    /// Same surface with the decorative guide removed.
    pub fn without_guide(&self) -> RenderSurface {
        self.retain(|layer| !matches!(layer, Layer::Guide(_)))
    }

    /// Only the image layer, on a transparent canvas.
    pub fn image_only(&self) -> RenderSurface {
        self.retain(|layer| matches!(layer, Layer::Image(_)))
    }

    fn retain(&self, keep: impl Fn(&Layer) -> bool) -> RenderSurface {
        RenderSurface {
            size: self.size,
            layers: self.layers.iter().copied().filter(|l| keep(l)).collect(),
        }
    }
}

/// Factor that fits a `width`×`height` image inside the canvas, shrunk by
/// `fit_ratio`. Independent of the interactive zoom.
pub fn fit_scale(canvas_size: u32, width: u32, height: u32, fit_ratio: f64) -> f64 {
    let canvas = canvas_size as f64;
    (canvas / width as f64).min(canvas / height as f64) * fit_ratio
}

/// Describe the editor canvas for `source` under `state`.
///
/// Pure: the same inputs always give an equal surface.
pub fn render_surface(
    source: &SourceImage,
    state: &TransformState,
    config: &CompositorConfig,
) -> RenderSurface {
    let mut layers = backdrop_layers(config);

    let fit = fit_scale(
        config.canvas_size,
        source.width(),
        source.height(),
        config.fit_ratio,
    );
    let draw_width = source.width() as f64 * fit;
    let draw_height = source.height() as f64 * fit;
    let half = config.canvas_size as f64 / 2.0;

    let image = ImageLayer {
        source_width: source.width(),
        source_height: source.height(),
        transform: Affine::translate(Vec2::new(half, half)) * state.local_affine(),
        dest: Rect::new(
            -draw_width / 2.0,
            -draw_height / 2.0,
            draw_width / 2.0,
            draw_height / 2.0,
        ),
    };
    // Image sits between the backdrop and the guide
    layers.insert(1, Layer::Image(image));

    RenderSurface {
        size: config.canvas_size,
        layers,
    }
}

/// Canvas with only the backdrop and guide, shown before an image decodes.
pub fn empty_surface(config: &CompositorConfig) -> RenderSurface {
    RenderSurface {
        size: config.canvas_size,
        layers: backdrop_layers(config),
    }
}

fn backdrop_layers(config: &CompositorConfig) -> Vec<Layer> {
    let size = config.canvas_size as f64;
    vec![
        Layer::Backdrop(Checkerboard {
            tile_size: config.tile_size,
            base: config.checker_base,
            alternate: config.checker_alternate,
        }),
        Layer::Guide(GuideCircle {
            center: Point::new(size / 2.0, size / 2.0),
            radius: size * config.guide_radius_ratio,
            stroke: config.guide_color,
            line_width: config.guide_line_width,
            dash: config.guide_dash,
        }),
    ]
}
