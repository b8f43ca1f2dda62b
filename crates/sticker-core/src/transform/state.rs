//! Interactive transform state: zoom, quarter-turn rotation and pan offset.

use kurbo::{Affine, Vec2};

/// Smallest zoom the slider allows.
pub const MIN_SCALE: f64 = 0.5;
/// Largest zoom the slider allows.
pub const MAX_SCALE: f64 = 3.0;

/// Direction of a quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    /// +90 degrees (clockwise on a y-down canvas).
    Clockwise,
    /// -90 degrees.
    CounterClockwise,
}

impl RotateDirection {
    /// Signed step in degrees.
    pub fn degrees(self) -> i32 {
        match self {
            RotateDirection::Clockwise => 90,
            RotateDirection::CounterClockwise => -90,
        }
    }
}

impl TryFrom<i32> for RotateDirection {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            90 => Ok(RotateDirection::Clockwise),
            -90 => Ok(RotateDirection::CounterClockwise),
            other => Err(other),
        }
    }
}

/// The editor's current transform.
///
/// `offset` lives in image-local (pre-rotation, pre-scale) space; see
/// [`crate::transform::DragGesture`] for how screen drags are mapped into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    scale: f64,
    rotation_degrees: i32,
    offset: Vec2,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl TransformState {
    /// Scale 1, no rotation, no offset.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        rotation_degrees: 0,
        offset: Vec2::ZERO,
    };

    pub fn new() -> Self {
        Self::IDENTITY
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rotation in degrees, always in `[0, 360)`.
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Set the zoom, clamped to `[MIN_SCALE, MAX_SCALE]`.
    ///
    /// Out-of-range values are clamped, never rejected. NaN is ignored so a
    /// bad slider event cannot poison the transform.
    pub fn set_scale(&mut self, value: f64) {
        if value.is_nan() {
            log::warn!("ignoring NaN scale");
            return;
        }
        self.scale = value.clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Rotate by a quarter turn, keeping the angle in `[0, 360)`.
    pub fn rotate(&mut self, direction: RotateDirection) {
        self.rotation_degrees = (self.rotation_degrees + direction.degrees()).rem_euclid(360);
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Whether this is the reset state.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Rotation then uniform scale then offset, in the order the canvas
    /// applies them (excluding the move to canvas center).
    pub fn local_affine(&self) -> Affine {
        rotation_affine(self.rotation_degrees)
            * Affine::scale(self.scale)
            * Affine::translate(self.offset)
    }
}

/// `(sin, cos)` of an angle in degrees, exact for quarter turns.
pub fn sin_cos_degrees(degrees: i32) -> (f64, f64) {
    match degrees.rem_euclid(360) {
        0 => (0.0, 1.0),
        90 => (1.0, 0.0),
        180 => (0.0, -1.0),
        270 => (-1.0, 0.0),
        other => (other as f64).to_radians().sin_cos(),
    }
}

/// Rotation about the origin on a y-down canvas (positive = clockwise).
pub fn rotation_affine(degrees: i32) -> Affine {
    let (sin, cos) = sin_cos_degrees(degrees);
    Affine::new([cos, sin, -sin, cos, 0.0, 0.0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use proptest::prelude::*;

    #[test]
    fn test_identity_default() {
        let state = TransformState::default();
        assert!(state.is_identity());
        assert_eq!(state.scale(), 1.0);
        assert_eq!(state.rotation_degrees(), 0);
        assert_eq!(state.offset(), Vec2::ZERO);
    }

    #[test]
    fn test_set_scale_clamps() {
        let mut state = TransformState::new();

        state.set_scale(-5.0);
        assert_eq!(state.scale(), 0.5);

        state.set_scale(10.0);
        assert_eq!(state.scale(), 3.0);

        state.set_scale(1.7);
        assert_eq!(state.scale(), 1.7);
    }

    #[test]
    fn test_set_scale_infinity_clamps() {
        let mut state = TransformState::new();
        state.set_scale(f64::INFINITY);
        assert_eq!(state.scale(), MAX_SCALE);
        state.set_scale(f64::NEG_INFINITY);
        assert_eq!(state.scale(), MIN_SCALE);
    }

    #[test]
    fn test_set_scale_nan_ignored() {
        let mut state = TransformState::new();
        state.set_scale(2.0);
        state.set_scale(f64::NAN);
        assert_eq!(state.scale(), 2.0);
    }

    #[test]
    fn test_rotate_normalizes() {
        let mut state = TransformState::new();
        state.rotate(RotateDirection::CounterClockwise);
        assert_eq!(state.rotation_degrees(), 270);
        state.rotate(RotateDirection::Clockwise);
        state.rotate(RotateDirection::Clockwise);
        assert_eq!(state.rotation_degrees(), 90);
    }

    #[test]
    fn test_rotate_direction_from_i32() {
        assert_eq!(RotateDirection::try_from(90), Ok(RotateDirection::Clockwise));
        assert_eq!(
            RotateDirection::try_from(-90),
            Ok(RotateDirection::CounterClockwise)
        );
        assert_eq!(RotateDirection::try_from(45), Err(45));
    }

    #[test]
    fn test_sin_cos_exact_quarters() {
        assert_eq!(sin_cos_degrees(0), (0.0, 1.0));
        assert_eq!(sin_cos_degrees(90), (1.0, 0.0));
        assert_eq!(sin_cos_degrees(-90), (-1.0, 0.0));
        assert_eq!(sin_cos_degrees(450), (1.0, 0.0));
    }

    #[test]
    fn test_rotation_affine_is_clockwise_on_screen() {
        // +x rotated by 90 degrees points down (+y) on a y-down canvas
        let p = rotation_affine(90) * Point::new(1.0, 0.0);
        assert_eq!(p, Point::new(0.0, 1.0));
    }

    #[test]
    fn test_local_affine_order() {
        let mut state = TransformState::new();
        state.rotate(RotateDirection::Clockwise);
        state.set_scale(2.0);
        state.set_offset(Vec2::new(5.0, 0.0));

        // Offset applied first, then scale, then rotation
        let p = state.local_affine() * Point::ORIGIN;
        assert_eq!(p, Point::new(0.0, 10.0));
    }

    proptest! {
        #[test]
        fn prop_scale_always_in_bounds(value in proptest::num::f64::ANY) {
            let mut state = TransformState::new();
            state.set_scale(value);
            prop_assert!(state.scale() >= MIN_SCALE && state.scale() <= MAX_SCALE);
        }

        #[test]
        fn prop_four_rotations_close(turns in 0usize..8, clockwise in any::<bool>()) {
            let mut state = TransformState::new();
            let direction = if clockwise {
                RotateDirection::Clockwise
            } else {
                RotateDirection::CounterClockwise
            };
            for _ in 0..turns {
                state.rotate(direction);
            }
            let before = state.rotation_degrees();
            for _ in 0..4 {
                state.rotate(direction);
            }
            prop_assert_eq!(state.rotation_degrees(), before);
            prop_assert!((0..360).contains(&state.rotation_degrees()));
        }
    }
}
