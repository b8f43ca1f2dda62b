//! Software rasterizer for [`RenderSurface`] descriptions.
//!
//! # Algorithm
//!
//! Layers are painted back to front with source-over compositing onto a
//! transparent RGBA canvas.
//!
//! The image layer uses inverse mapping: for each canvas pixel center we
//! compute where it lands in the source image and interpolate there:
//!
//! ```text
//! (u, v) = image_to_canvas⁻¹ · (x + 0.5, y + 0.5)
//! ```
//!
//! Canvas pixels whose center maps outside `[0, w) × [0, h)` are left
//! untouched, so the image has crisp edges and nothing outside its rectangle
//! is painted.

use image::RgbaImage;
use kurbo::Point;

use super::surface::{Checkerboard, Color, GuideCircle, ImageLayer, Layer, RenderSurface};
use crate::decode::SourceImage;

/// Paint `surface` into a new `size`×`size` RGBA image.
///
/// `source` supplies pixels for the image layer; pass `None` when no image
/// is loaded (any image layer is then skipped).
pub fn rasterize(surface: &RenderSurface, source: Option<&SourceImage>) -> RgbaImage {
    let mut canvas = RgbaImage::new(surface.size, surface.size);

    for layer in &surface.layers {
        match layer {
            Layer::Backdrop(board) => paint_checkerboard(&mut canvas, board),
            Layer::Image(image) => match source {
                Some(src) => paint_image(&mut canvas, image, src),
                None => log::warn!("image layer without source pixels, skipping"),
            },
            Layer::Guide(guide) => paint_guide(&mut canvas, guide),
        }
    }

    canvas
}

fn paint_checkerboard(canvas: &mut RgbaImage, board: &Checkerboard) {
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        pixel.0 = source_over(pixel.0, board.color_at(x, y), 1.0);
    }
}

fn paint_image(canvas: &mut RgbaImage, layer: &ImageLayer, source: &SourceImage) {
    if layer.source_width != source.width() || layer.source_height != source.height() {
        log::warn!(
            "image layer expects {}x{} but source is {}x{}",
            layer.source_width,
            layer.source_height,
            source.width(),
            source.height()
        );
        return;
    }

    let to_canvas = layer.image_to_canvas();
    if to_canvas.determinant().abs() < f64::EPSILON {
        return;
    }
    let to_source = to_canvas.inverse();

    let (src_w, src_h) = (source.width() as f64, source.height() as f64);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let p = to_source * Point::new(x as f64 + 0.5, y as f64 + 0.5);
        if p.x < 0.0 || p.x >= src_w || p.y < 0.0 || p.y >= src_h {
            continue;
        }

        let sample = sample_bilinear(source, p.x, p.y);
        pixel.0 = source_over(pixel.0, sample, 1.0);
    }
}

fn paint_guide(canvas: &mut RgbaImage, guide: &GuideCircle) {
    let half_width = guide.line_width / 2.0;
    let period = guide.dash[0] + guide.dash[1];

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - guide.center.x;
        let dy = y as f64 + 0.5 - guide.center.y;
        let distance = (dx * dx + dy * dy).sqrt();

        // Coverage falls off over one pixel on either side of the stroke
        let coverage = (half_width + 0.5 - (distance - guide.radius).abs()).clamp(0.0, 1.0);
        if coverage <= 0.0 {
            continue;
        }

        if period > 0.0 {
            // Arc length from angle 0, running clockwise like canvas arcs
            let angle = dy.atan2(dx).rem_euclid(std::f64::consts::TAU);
            if (angle * guide.radius) % period >= guide.dash[0] {
                continue;
            }
        }

        pixel.0 = source_over(pixel.0, guide.stroke, coverage);
    }
}

/// Bilinear sample at continuous source coordinates, edge-clamped.
///
/// Interpolates premultiplied values so transparent neighbours don't bleed
/// their (meaningless) color into the result. Returns straight RGBA.
fn sample_bilinear(source: &SourceImage, u: f64, v: f64) -> Color {
    let fx = u - 0.5;
    let fy = v - 0.5;
    let x0f = fx.floor();
    let y0f = fy.floor();
    let tx = fx - x0f;
    let ty = fy - y0f;

    let max_x = source.width() as i64 - 1;
    let max_y = source.height() as i64 - 1;
    let x0 = (x0f as i64).clamp(0, max_x) as u32;
    let x1 = (x0f as i64 + 1).clamp(0, max_x) as u32;
    let y0 = (y0f as i64).clamp(0, max_y) as u32;
    let y1 = (y0f as i64 + 1).clamp(0, max_y) as u32;

    let p00 = premultiplied(source.pixel(x0, y0));
    let p10 = premultiplied(source.pixel(x1, y0));
    let p01 = premultiplied(source.pixel(x0, y1));
    let p11 = premultiplied(source.pixel(x1, y1));

    let mut acc = [0.0f64; 4];
    for i in 0..4 {
        acc[i] = p00[i] * (1.0 - tx) * (1.0 - ty)
            + p10[i] * tx * (1.0 - ty)
            + p01[i] * (1.0 - tx) * ty
            + p11[i] * tx * ty;
    }

    let alpha = acc[3];
    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }
    [
        to_u8(acc[0] * 255.0 / alpha),
        to_u8(acc[1] * 255.0 / alpha),
        to_u8(acc[2] * 255.0 / alpha),
        to_u8(alpha),
    ]
}

#[inline]
fn premultiplied(p: [u8; 4]) -> [f64; 4] {
    let a = p[3] as f64;
    [
        p[0] as f64 * a / 255.0,
        p[1] as f64 * a / 255.0,
        p[2] as f64 * a / 255.0,
        a,
    ]
}

#[inline]
fn to_u8(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

/// Composite straight-alpha `src` over `dst`, with `src` alpha further
/// scaled by `coverage`.
fn source_over(dst: Color, src: Color, coverage: f64) -> Color {
    let sa = src[3] as f64 / 255.0 * coverage;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let c = (src[i] as f64 * sa + dst[i] as f64 * da * (1.0 - sa)) / out_a;
        out[i] = to_u8(c);
    }
    out[3] = to_u8(out_a * 255.0);
    out
}
