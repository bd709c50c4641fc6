//! Rasterizes one tile by sampling the escape-time classifier on a regular grid.

use crate::escape::{classify, Precision};
use glam::DVec2;

/// Iteration settings shared by every tile fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillParams {
    /// Maximum number of iterations before a point is considered bounded.
    pub depth: u32,
    pub precision: Precision,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            depth: 500,
            precision: Precision::Double,
        }
    }
}

/// Fills a fresh `px_w * px_h` buffer for the tile whose corner is `origin`.
pub fn fill(origin: DVec2, extent: DVec2, px_w: u32, px_h: u32, params: FillParams) -> Box<[f32]> {
    let mut pixels = vec![0.0f32; px_w as usize * px_h as usize].into_boxed_slice();
    fill_into(&mut pixels, origin, extent, px_w, px_h, params);
    pixels
}

/// Fills `pixels` in place, row-major, one value per pixel centre.
///
/// Plane Y grows upward while pixel rows grow downward, so row `i` samples
/// `origin.y - (i + 0.5) * step_y`.
///
/// # Panics
/// If `pixels` does not hold exactly `px_w * px_h` values.
pub fn fill_into(
    pixels: &mut [f32],
    origin: DVec2,
    extent: DVec2,
    px_w: u32,
    px_h: u32,
    params: FillParams,
) {
    assert_eq!(
        pixels.len(),
        px_w as usize * px_h as usize,
        "tile buffer does not match tile pixel size"
    );

    if px_w == 0 {
        return;
    }

    let step_x = extent.x / px_w as f64;
    let step_y = extent.y / px_h as f64;

    for (i, row) in pixels.chunks_exact_mut(px_w as usize).enumerate() {
        let y = origin.y - (i as f64 + 0.5) * step_y;

        for (j, px) in row.iter_mut().enumerate() {
            let x = origin.x + (j as f64 + 0.5) * step_x;
            *px = classify(x, y, params.depth, params.precision).as_value();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: FillParams = FillParams {
        depth: 200,
        precision: Precision::Double,
    };

    #[test]
    fn buffer_has_one_value_per_pixel() {
        let pixels = fill(DVec2::new(-2.0, 1.5), DVec2::new(3.0, 3.0), 16, 8, PARAMS);
        assert_eq!(pixels.len(), 16 * 8);
        assert!(pixels.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn fill_is_deterministic() {
        let origin = DVec2::new(-0.75, 0.25);
        let extent = DVec2::new(0.5, 0.5);

        let a = fill(origin, extent, 32, 32, PARAMS);
        let b = fill(origin, extent, 32, 32, PARAMS);

        let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn tile_far_outside_the_set_is_all_escaped() {
        let pixels = fill(DVec2::new(5.0, 5.0), DVec2::new(1.0, 1.0), 8, 8, PARAMS);
        assert!(pixels.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn tile_inside_the_cardioid_is_all_bounded() {
        // [-0.3, -0.1] x [-0.1, 0.1] sits well inside the main cardioid.
        let pixels = fill(DVec2::new(-0.3, 0.1), DVec2::new(0.2, 0.2), 8, 8, PARAMS);
        assert!(pixels.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rows_run_downward_in_the_plane() {
        // One pixel column on x = 0, rows at y = 0.5, -0.5, -1.5, -2.5.
        let origin = DVec2::new(-0.1, 1.0);
        let extent = DVec2::new(0.2, 4.0);
        let pixels = fill(origin, extent, 1, 4, PARAMS);

        let expected: Vec<f32> = (0..4)
            .map(|i| {
                let y = 1.0 - (i as f64 + 0.5);
                classify(0.0, y, PARAMS.depth, PARAMS.precision).as_value()
            })
            .collect();
        assert_eq!(pixels.to_vec(), expected);
        // y = -2.5 is outside radius two.
        assert_eq!(pixels[3], 1.0);
    }

    #[test]
    fn fill_into_reuses_the_buffer() {
        let mut pixels = vec![7.0f32; 4 * 4];
        fill_into(&mut pixels, DVec2::new(5.0, 5.0), DVec2::ONE, 4, 4, PARAMS);
        assert!(pixels.iter().all(|&v| v == 1.0));
    }

    #[test]
    #[should_panic(expected = "tile buffer does not match")]
    fn mismatched_buffer_panics() {
        let mut pixels = vec![0.0f32; 3];
        fill_into(&mut pixels, DVec2::ZERO, DVec2::ONE, 2, 2, PARAMS);
    }
}
