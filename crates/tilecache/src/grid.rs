//! Fixed pool of tile slots laid over the viewport.
//!
//! Slots are addressed row-major over `(cols + 1) x (rows + 1)` cells. Each
//! slot owns its pixel buffer for the lifetime of the cache; invalidation only
//! flips state, it never reallocates.

use crate::error::TileError;
use crate::fill::{fill_into, FillParams};
use crate::viewport::{GridGeometry, PlaneRect, Viewport};
use glam::{DVec2, UVec2};
use std::num::NonZeroU32;

/// Cache validity of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Nothing valid to show; the draw stage falls back to the placeholder layer.
    Unassigned,
    /// Pixels are filled and uploaded to this texture-array layer.
    Computed(NonZeroU32),
}

impl SlotState {
    /// Layer to sample when drawing, `0` being the placeholder.
    #[inline]
    pub fn layer_or_zero(self) -> u32 {
        match self {
            SlotState::Unassigned => 0,
            SlotState::Computed(layer) => layer.get(),
        }
    }

    #[inline]
    pub fn is_computed(self) -> bool {
        matches!(self, SlotState::Computed(_))
    }
}

#[derive(Debug, Clone)]
pub struct TileSlot {
    grid_position: UVec2,
    plane_position: DVec2,
    state: SlotState,
    pixels: Box<[f32]>,
}

impl TileSlot {
    /// `(col, row)` of the slot.
    #[inline]
    pub fn grid_position(&self) -> UVec2 {
        self.grid_position
    }

    /// Tile corner in plane units; the tile spans `+x` and `-y` from here.
    #[inline]
    pub fn plane_position(&self) -> DVec2 {
        self.plane_position
    }

    #[inline]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

pub struct TileCache {
    grid: GridGeometry,
    tile_px: UVec2,
    slots: Vec<TileSlot>,
    tile_extent: DVec2,
    // Plane region covered by the positioned slots, `None` until positioned.
    coverage: Option<PlaneRect>,
    // Every slot below this index is computed.
    cursor: usize,
    computed: usize,
    needs_reposition: bool,
    generation: u64,
}

impl TileCache {
    pub fn new(grid: GridGeometry, tile_px: UVec2, reserve_multiplier: u32) -> Result<Self, TileError> {
        if tile_px.x == 0 || tile_px.y == 0 {
            return Err(TileError::EmptyTile {
                width: tile_px.x,
                height: tile_px.y,
            });
        }
        if reserve_multiplier == 0 {
            return Err(TileError::ReserveMultiplier(reserve_multiplier));
        }

        let addressable = grid.addressable();
        let reserved = (reserve_multiplier as usize * grid.cols as usize * grid.rows as usize).max(addressable);
        let pixel_len = tile_px.x as usize * tile_px.y as usize;

        let mut slots = Vec::with_capacity(reserved);
        for row in 0..grid.slot_rows() {
            for col in 0..grid.slot_cols() {
                slots.push(TileSlot {
                    grid_position: UVec2::new(col, row),
                    plane_position: DVec2::ZERO,
                    state: SlotState::Unassigned,
                    pixels: vec![0.0; pixel_len].into_boxed_slice(),
                });
            }
        }

        log::info!(
            "tile cache: {}x{} grid, {} slots ({} reserved), {}x{} px per tile",
            grid.cols,
            grid.rows,
            slots.len(),
            reserved,
            tile_px.x,
            tile_px.y
        );

        Ok(Self {
            grid,
            tile_px,
            slots,
            tile_extent: DVec2::ZERO,
            coverage: None,
            cursor: 0,
            computed: 0,
            needs_reposition: true,
            generation: 0,
        })
    }

    #[inline]
    pub fn grid(&self) -> GridGeometry {
        self.grid
    }

    #[inline]
    pub fn tile_px(&self) -> UVec2 {
        self.tile_px
    }

    #[inline]
    pub fn slots(&self) -> &[TileSlot] {
        &self.slots
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot capacity reserved up front.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Texture-array layers needed: one per slot plus the placeholder.
    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.slots.len() as u32 + 1
    }

    /// Row-major slot index of `(col, row)`.
    #[inline]
    pub fn index_of(&self, col: u32, row: u32) -> Option<usize> {
        (col < self.grid.slot_cols() && row < self.grid.slot_rows())
            .then(|| row as usize * self.grid.slot_cols() as usize + col as usize)
    }

    /// Texture layer owned by slot `index`. Layer 0 is the placeholder.
    #[inline]
    pub fn layer_for(index: usize) -> NonZeroU32 {
        NonZeroU32::MIN.saturating_add(index as u32)
    }

    /// Tile extent recorded at the last positioning pass.
    #[inline]
    pub fn tile_extent(&self) -> DVec2 {
        self.tile_extent
    }

    #[inline]
    pub fn computed_count(&self) -> usize {
        self.computed
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        !self.needs_reposition && self.computed == self.slots.len()
    }

    #[inline]
    pub fn needs_reposition(&self) -> bool {
        self.needs_reposition
    }

    /// Bumped whenever any slot position or state changes.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Plane region covered by the positioned grid.
    #[inline]
    pub fn coverage(&self) -> Option<PlaneRect> {
        self.coverage
    }

    /// True if the positioned grid spans all of `rect`.
    pub fn covers(&self, rect: &PlaneRect) -> bool {
        self.coverage.is_some_and(|c| c.contains(rect))
    }

    /// Drops every slot back to `Unassigned` and requests a positioning pass.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.state = SlotState::Unassigned;
        }
        self.cursor = 0;
        self.computed = 0;
        self.needs_reposition = true;
        self.generation += 1;
    }

    /// Invalidates the grid if the viewport left the positioned region.
    ///
    /// Returns whether an invalidation happened.
    pub fn ensure_covers(&mut self, rect: &PlaneRect) -> bool {
        if self.needs_reposition || self.covers(rect) {
            return false;
        }
        log::debug!("viewport left the tile grid; repositioning");
        self.invalidate_all();
        true
    }

    /// Recomputes every slot position from the viewport and resets all state.
    pub fn position_slots(&mut self, viewport: &Viewport) {
        debug_assert_eq!(viewport.grid(), self.grid, "grid geometry is fixed");

        let origin = viewport.rect().origin;
        let extent = viewport.tile_extent();

        for slot in &mut self.slots {
            slot.plane_position = origin + slot.grid_position.as_dvec2() * extent;
            slot.state = SlotState::Unassigned;
        }

        // Row r spans [y_r - extent.y, y_r], so coverage starts one tile below the origin.
        self.coverage = Some(PlaneRect {
            origin: DVec2::new(origin.x, origin.y - extent.y),
            size: DVec2::new(
                self.grid.slot_cols() as f64 * extent.x,
                self.grid.slot_rows() as f64 * extent.y,
            ),
        });
        self.tile_extent = extent;
        self.cursor = 0;
        self.computed = 0;
        self.needs_reposition = false;
        self.generation += 1;
    }

    /// First unassigned slot in row-major order.
    pub fn next_unassigned(&self) -> Option<usize> {
        if self.needs_reposition {
            return None;
        }
        self.slots[self.cursor..]
            .iter()
            .position(|slot| !slot.state.is_computed())
            .map(|offset| self.cursor + offset)
    }

    /// Fills the pixel buffer of slot `index` at its current position.
    pub fn fill_slot(&mut self, index: usize, params: FillParams) -> &[f32] {
        let extent = self.tile_extent;
        let TileSlot {
            plane_position,
            pixels,
            ..
        } = &mut self.slots[index];

        fill_into(pixels, *plane_position, extent, self.tile_px.x, self.tile_px.y, params);
        pixels
    }

    /// Records that slot `index` holds valid pixels in `layer`.
    pub fn mark_computed(&mut self, index: usize, layer: NonZeroU32) {
        let slot = &mut self.slots[index];
        if !slot.state.is_computed() {
            self.computed += 1;
        }
        slot.state = SlotState::Computed(layer);

        while self.cursor < self.slots.len() && self.slots[self.cursor].state.is_computed() {
            self.cursor += 1;
        }
        self.generation += 1;
    }
}
