//! The visible rectangle of the complex plane and its tile subdivision.

use crate::error::TileError;
use glam::{DVec2, UVec2};

/// An axis-aligned rectangle in complex-plane units.
///
/// `origin` is the lower-left corner; plane Y grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneRect {
    pub origin: DVec2,
    pub size: DVec2,
}

impl PlaneRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, TileError> {
        let rect = Self {
            origin: DVec2::new(x, y),
            size: DVec2::new(width, height),
        };
        rect.check()?;
        Ok(rect)
    }

    #[inline]
    pub fn max(&self) -> DVec2 {
        self.origin + self.size
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &PlaneRect) -> bool {
        let (lo, hi) = (self.origin, self.max());
        let (olo, ohi) = (other.origin, other.max());
        olo.x >= lo.x && olo.y >= lo.y && ohi.x <= hi.x && ohi.y <= hi.y
    }

    fn check(&self) -> Result<(), TileError> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        if ok(self.size.x) && ok(self.size.y) && self.origin.is_finite() {
            Ok(())
        } else {
            Err(TileError::DegenerateViewport {
                width: self.size.x,
                height: self.size.y,
            })
        }
    }
}

/// Fixed tile subdivision of the viewport, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub cols: u32,
    pub rows: u32,
}

impl GridGeometry {
    pub fn new(cols: u32, rows: u32) -> Result<Self, TileError> {
        if cols == 0 || rows == 0 {
            return Err(TileError::EmptyGrid { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    /// Enough tiles of `tile_px` pixels to span a `window_px` framebuffer.
    pub fn for_window(window_px: UVec2, tile_px: UVec2) -> Result<Self, TileError> {
        if tile_px.x == 0 || tile_px.y == 0 {
            return Err(TileError::EmptyTile {
                width: tile_px.x,
                height: tile_px.y,
            });
        }
        Self::new(window_px.x.div_ceil(tile_px.x), window_px.y.div_ceil(tile_px.y))
    }

    /// Addressable cells per row, including the boundary column.
    #[inline]
    pub fn slot_cols(&self) -> u32 {
        self.cols + 1
    }

    /// Addressable cells per column, including the boundary row.
    #[inline]
    pub fn slot_rows(&self) -> u32 {
        self.rows + 1
    }

    /// Total addressable cells, `(cols + 1) * (rows + 1)`.
    #[inline]
    pub fn addressable(&self) -> usize {
        self.slot_cols() as usize * self.slot_rows() as usize
    }
}

/// What a viewport mutation did to the plane-to-tile mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Unchanged,
    /// Origin translated; tile extent unchanged.
    Moved,
    /// Size changed; every tile is stale.
    Resized,
}

impl ViewChange {
    #[inline]
    pub fn invalidates(self) -> bool {
        self == ViewChange::Resized
    }
}

/// Converts a zoom-in factor into the zoom-out factor that exactly undoes it.
#[inline]
pub fn inverse_zoom(factor: f64) -> f64 {
    -factor / (1.0 - factor)
}

/// Owns the visible plane rectangle, the window it maps to, and the derived
/// per-tile extent.
#[derive(Debug, Clone)]
pub struct Viewport {
    rect: PlaneRect,
    grid: GridGeometry,
    window_px: UVec2,
    tile_extent: DVec2,
}

impl Viewport {
    pub fn new(rect: PlaneRect, grid: GridGeometry, window_px: UVec2) -> Result<Self, TileError> {
        rect.check()?;
        if window_px.x == 0 || window_px.y == 0 {
            return Err(TileError::EmptyWindow {
                width: window_px.x,
                height: window_px.y,
            });
        }

        let mut viewport = Self {
            rect,
            grid,
            window_px,
            tile_extent: DVec2::ZERO,
        };
        viewport.update_extent();
        Ok(viewport)
    }

    #[inline]
    pub fn rect(&self) -> &PlaneRect {
        &self.rect
    }

    #[inline]
    pub fn grid(&self) -> GridGeometry {
        self.grid
    }

    #[inline]
    pub fn window_px(&self) -> UVec2 {
        self.window_px
    }

    /// Size of one tile in plane units.
    #[inline]
    pub fn tile_extent(&self) -> DVec2 {
        self.tile_extent
    }

    /// Plane coordinate under a window pixel (pixel rows grow downward).
    pub fn plane_at(&self, px: DVec2) -> DVec2 {
        let frac = self.window_fraction(px);
        self.rect.origin + frac * self.rect.size
    }

    /// Converts a window pixel into a `[0, 1]` fraction of the view, Y up.
    pub fn window_fraction(&self, px: DVec2) -> DVec2 {
        let w = self.window_px.as_dvec2();
        DVec2::new(px.x / w.x, 1.0 - px.y / w.y)
    }

    /// Shrinks (`factor > 0`) or grows (`factor < 0`) the view by `factor`
    /// of its size, keeping the point at `anchor` (fraction of the view) fixed.
    pub fn zoom(&mut self, factor: f64, anchor: DVec2) -> Result<ViewChange, TileError> {
        if !factor.is_finite() || factor >= 1.0 {
            return Err(TileError::ZoomFactor(factor));
        }
        if factor == 0.0 {
            return Ok(ViewChange::Unchanged);
        }

        let removed = self.rect.size * factor;
        let next = PlaneRect {
            origin: self.rect.origin + removed * anchor,
            size: self.rect.size - removed,
        };
        next.check()?;

        self.rect = next;
        self.update_extent();
        log::debug!(
            "zoom {:+.3} -> origin=({:.6e},{:.6e}) size=({:.6e},{:.6e})",
            factor,
            self.rect.origin.x,
            self.rect.origin.y,
            self.rect.size.x,
            self.rect.size.y
        );
        Ok(ViewChange::Resized)
    }

    /// Translates by a window-pixel drag delta (pixel Y grows downward).
    pub fn pan(&mut self, delta_px: DVec2) -> ViewChange {
        let w = self.window_px.as_dvec2();
        let delta = DVec2::new(
            -delta_px.x / w.x * self.rect.size.x,
            delta_px.y / w.y * self.rect.size.y,
        );
        self.pan_plane(delta)
    }

    /// Translates by a delta in plane units.
    pub fn pan_plane(&mut self, delta: DVec2) -> ViewChange {
        if delta == DVec2::ZERO || !delta.is_finite() {
            return ViewChange::Unchanged;
        }
        self.rect.origin += delta;
        ViewChange::Moved
    }

    /// Follows a framebuffer resize, keeping plane units per pixel constant.
    ///
    /// A zero-sized framebuffer (minimised window) is ignored.
    pub fn resize(&mut self, new_px: UVec2) -> ViewChange {
        if new_px.x == 0 || new_px.y == 0 || new_px == self.window_px {
            return ViewChange::Unchanged;
        }

        let scale = new_px.as_dvec2() / self.window_px.as_dvec2();
        self.rect.size *= scale;
        self.window_px = new_px;
        self.update_extent();
        log::debug!(
            "resize -> {}x{} px, size=({:.6e},{:.6e})",
            new_px.x,
            new_px.y,
            self.rect.size.x,
            self.rect.size.y
        );
        ViewChange::Resized
    }

    fn update_extent(&mut self) {
        self.tile_extent = DVec2::new(
            self.rect.size.x / self.grid.cols as f64,
            self.rect.size.y / self.grid.rows as f64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).abs().max_element() < 1e-12
    }

    fn viewport(x: f64, y: f64, w: f64, h: f64) -> Viewport {
        Viewport::new(
            PlaneRect::new(x, y, w, h).unwrap(),
            GridGeometry::new(4, 4).unwrap(),
            UVec2::new(800, 600),
        )
        .unwrap()
    }

    #[test]
    fn tile_extent_divides_the_view() {
        let vp = viewport(-2.0, -1.5, 3.0, 3.0);
        assert!(close(vp.tile_extent(), DVec2::new(0.75, 0.75)));
    }

    #[test]
    fn centred_zoom_in() {
        let mut vp = viewport(-1.8, -1.0, 2.4, 2.0);
        let change = vp.zoom(0.2, DVec2::splat(0.5)).unwrap();

        assert_eq!(change, ViewChange::Resized);
        assert!(change.invalidates());
        assert!(close(vp.rect().origin, DVec2::new(-1.56, -0.8)));
        assert!(close(vp.rect().size, DVec2::new(1.92, 1.6)));
        assert!(close(vp.tile_extent(), DVec2::new(0.48, 0.4)));
    }

    #[test]
    fn zoom_out_undoes_zoom_in() {
        let mut vp = viewport(-1.8, -1.0, 2.4, 2.0);
        vp.zoom(0.2, DVec2::splat(0.5)).unwrap();
        vp.zoom(inverse_zoom(0.2), DVec2::splat(0.5)).unwrap();

        assert!(close(vp.rect().origin, DVec2::new(-1.8, -1.0)));
        assert!(close(vp.rect().size, DVec2::new(2.4, 2.0)));
    }

    #[test]
    fn zoom_keeps_anchor_point_fixed() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        let anchor = DVec2::new(0.25, 0.75);
        let before = vp.rect().origin + anchor * vp.rect().size;
        vp.zoom(0.5, anchor).unwrap();
        let after = vp.rect().origin + anchor * vp.rect().size;
        assert!(close(before, after));
    }

    #[test]
    fn zoom_rejects_collapsing_factor() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        assert_eq!(vp.zoom(1.0, DVec2::splat(0.5)), Err(TileError::ZoomFactor(1.0)));
        assert!(vp.zoom(f64::NAN, DVec2::splat(0.5)).is_err());
        assert!(close(vp.rect().size, DVec2::new(3.0, 3.0)));
    }

    #[test]
    fn zero_zoom_is_a_no_op() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        assert_eq!(vp.zoom(0.0, DVec2::splat(0.5)).unwrap(), ViewChange::Unchanged);
    }

    #[test]
    fn pan_moves_origin_by_window_fraction() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        let change = vp.pan(DVec2::new(80.0, -60.0));

        assert_eq!(change, ViewChange::Moved);
        assert!(!change.invalidates());
        // origin_x -= 80/800 * 3.0, origin_y += -60/600 * 3.0
        assert!(close(vp.rect().origin, DVec2::new(-2.3, -1.8)));
        assert!(close(vp.rect().size, DVec2::new(3.0, 3.0)));
        assert!(close(vp.tile_extent(), DVec2::new(0.75, 0.75)));
    }

    #[test]
    fn resize_preserves_plane_per_pixel() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        let per_px = vp.rect().size / vp.window_px().as_dvec2();

        let change = vp.resize(UVec2::new(1200, 300));
        assert_eq!(change, ViewChange::Resized);
        assert!(close(vp.rect().size / vp.window_px().as_dvec2(), per_px));
        assert!(close(vp.rect().origin, DVec2::new(-2.0, -1.5)));
        assert!(close(vp.tile_extent(), DVec2::new(4.5 / 4.0, 1.5 / 4.0)));
    }

    #[test]
    fn minimised_window_is_ignored() {
        let mut vp = viewport(-2.0, -1.5, 3.0, 3.0);
        assert_eq!(vp.resize(UVec2::new(0, 600)), ViewChange::Unchanged);
        assert_eq!(vp.resize(UVec2::new(800, 600)), ViewChange::Unchanged);
        assert_eq!(vp.window_px(), UVec2::new(800, 600));
    }

    #[test]
    fn window_pixel_to_plane() {
        let vp = viewport(-2.0, -1.5, 3.0, 3.0);
        assert!(close(vp.plane_at(DVec2::new(0.0, 600.0)), DVec2::new(-2.0, -1.5)));
        assert!(close(vp.plane_at(DVec2::new(400.0, 300.0)), DVec2::new(-0.5, 0.0)));
    }

    #[test]
    fn grid_for_window_rounds_up() {
        let grid = GridGeometry::for_window(UVec2::new(1200, 800), UVec2::splat(128)).unwrap();
        assert_eq!((grid.cols, grid.rows), (10, 7));
        assert_eq!(grid.addressable(), 11 * 8);
        assert!(GridGeometry::for_window(UVec2::new(1200, 800), UVec2::new(0, 128)).is_err());
    }

    #[test]
    fn degenerate_rects_are_rejected() {
        assert!(PlaneRect::new(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(PlaneRect::new(0.0, 0.0, 1.0, -1.0).is_err());
        assert!(PlaneRect::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
    }
}
