//! Editor transform: zoom, quarter-turn rotation and pointer panning.
//!
//! # Transform Order
//!
//! The compositor draws the source image with, from outermost to innermost:
//! 1. Move to canvas center
//! 2. Rotation (quarter turns)
//! 3. Uniform zoom
//! 4. Pan offset
//! 5. Fit-to-canvas sizing (constant per image)
//!
//! # Coordinate System
//!
//! - Canvas origin is the top-left corner, y grows downwards
//! - Positive rotation is clockwise on screen
//! - The pan offset is stored in image-local space, before rotation and zoom

mod drag;
mod state;

pub use drag::{screen_to_local, DragGesture};
pub use state::{
    rotation_affine, sin_cos_degrees, RotateDirection, TransformState, MAX_SCALE, MIN_SCALE,
};
