//! Escape-time classification of points in the complex plane.

use std::ops::{Add, Mul, Sub};

/// Squared escape radius. Once `|z|^2` reaches this the orbit diverges.
pub const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Result of iterating `z -> z^2 + c` from `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The orbit left the radius-2 disc within the depth bound.
    Escaped,
    /// The orbit stayed bounded for every iteration performed.
    Bounded,
}

impl Classification {
    /// Pixel value stored in tile buffers.
    #[inline]
    pub fn as_value(self) -> f32 {
        match self {
            Classification::Escaped => 1.0,
            Classification::Bounded => 0.0,
        }
    }
}

/// Arithmetic width used for the iteration.
///
/// Single precision bands visibly after a few zoom steps; double holds out
/// much longer but still runs out around a plane-per-pixel of ~1e-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// The minimum a float type needs to run the iteration.
pub trait Scalar: Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> {
    const ZERO: Self;
    const TWO: Self;
    const ESCAPE: Self;

    fn from_f64(v: f64) -> Self;
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const TWO: Self = 2.0;
    const ESCAPE: Self = ESCAPE_RADIUS_SQ as f32;

    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const TWO: Self = 2.0;
    const ESCAPE: Self = ESCAPE_RADIUS_SQ;

    #[inline(always)]
    fn from_f64(v: f64) -> Self {
        v
    }
}

/// Runs the escape-time iteration at a fixed scalar width.
#[inline]
pub fn classify_with<T: Scalar>(cx: T, cy: T, depth: u32) -> Classification {
    let mut zx = T::ZERO;
    let mut zy = T::ZERO;

    for _ in 0..depth {
        let zx_sq = zx * zx;
        let zy_sq = zy * zy;

        // z = z^2 + c
        let next_zx = zx_sq - zy_sq + cx;
        zy = T::TWO * zx * zy + cy;
        zx = next_zx;

        if zx * zx + zy * zy >= T::ESCAPE {
            return Classification::Escaped;
        }
    }

    Classification::Bounded
}

/// Classifies `c = cx + i*cy` at the requested precision.
#[inline]
pub fn classify(cx: f64, cy: f64, depth: u32, precision: Precision) -> Classification {
    match precision {
        Precision::Single => classify_with(f32::from_f64(cx), f32::from_f64(cy), depth),
        Precision::Double => classify_with(cx, cy, depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        for depth in [1, 2, 10, 500, 1000] {
            assert_eq!(classify(0.0, 0.0, depth, Precision::Double), Classification::Bounded);
            assert_eq!(classify(0.0, 0.0, depth, Precision::Single), Classification::Bounded);
        }
    }

    #[test]
    fn points_outside_radius_two_escape_on_first_iteration() {
        // A depth of one only leaves room for the first iteration.
        let outside = [(2.01, 0.0), (0.0, -2.5), (-1.6, 1.6), (10.0, 10.0), (-3.0, 0.0)];
        for (cx, cy) in outside {
            assert_eq!(classify(cx, cy, 1, Precision::Double), Classification::Escaped, "{cx},{cy}");
            assert_eq!(classify(cx, cy, 1, Precision::Single), Classification::Escaped, "{cx},{cy}");
        }
    }

    #[test]
    fn main_cardioid_and_bulb_stay_bounded() {
        let inside = [(-0.5, 0.0), (-1.0, 0.0), (0.25, 0.0), (-0.1, 0.6)];
        for (cx, cy) in inside {
            assert_eq!(classify(cx, cy, 1000, Precision::Double), Classification::Bounded, "{cx},{cy}");
        }
    }

    #[test]
    fn near_boundary_point_escapes_only_with_enough_depth() {
        // Just right of the cusp at 0.25; the orbit creeps out slowly.
        let (cx, cy) = (0.26, 0.0);
        assert_eq!(classify(cx, cy, 5, Precision::Double), Classification::Bounded);
        assert_eq!(classify(cx, cy, 1000, Precision::Double), Classification::Escaped);
    }

    #[test]
    fn zero_depth_classifies_everything_bounded() {
        assert_eq!(classify(100.0, 100.0, 0, Precision::Double), Classification::Bounded);
    }

    #[test]
    fn escape_check_is_inclusive() {
        // c = 2: z1 = 2, |z1|^2 == 4 exactly.
        assert_eq!(classify(2.0, 0.0, 1, Precision::Double), Classification::Escaped);
    }

    #[test]
    fn classification_values() {
        assert_eq!(Classification::Escaped.as_value(), 1.0);
        assert_eq!(Classification::Bounded.as_value(), 0.0);
    }
}
