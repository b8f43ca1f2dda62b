//! Pointer-drag panning.
//!
//! The editor draws the image as `translate(center) · rotate(θ) · scale(s) ·
//! translate(offset)`, so a screen-space pointer delta has to be
//! counter-rotated and divided by the zoom before it can be stored as an
//! offset. Otherwise dragging a rotated image would move it sideways.
//!
//! Each move recomputes the offset from a fixed anchor captured when the drag
//! began instead of accumulating per-event deltas:
//!
//! ```text
//! anchor = pointer_at_begin - offset_at_begin
//! offset = R(-θ) · (pointer - anchor) / s
//! ```
//!
//! Repeating a move with the same pointer position therefore always yields
//! the same offset.

use kurbo::{Point, Vec2};

use super::state::sin_cos_degrees;

/// An in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    anchor: Point,
}

impl DragGesture {
    /// Start a drag at `pointer` with the session's current offset.
    ///
    /// The offset is subtracted verbatim, without undoing rotation or zoom.
    pub fn begin(pointer: Point, offset: Vec2) -> Self {
        Self {
            anchor: pointer - offset,
        }
    }

    /// The fixed point deltas are measured from.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Offset for the pointer's current position.
    pub fn offset_for(&self, pointer: Point, rotation_degrees: i32, scale: f64) -> Vec2 {
        screen_to_local(pointer - self.anchor, rotation_degrees, scale)
    }
}

/// Map a screen-space delta into image-local offset space.
///
/// Applies `R(-θ)` then divides by `scale`.
pub fn screen_to_local(delta: Vec2, rotation_degrees: i32, scale: f64) -> Vec2 {
    let (sin, cos) = sin_cos_degrees(-rotation_degrees);
    let rotated = Vec2::new(
        delta.x * cos - delta.y * sin,
        delta.x * sin + delta.y * cos,
    );
    rotated / scale
}
