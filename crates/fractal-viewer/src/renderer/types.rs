//! GPU-side data layouts. Must match `TILES_WGSL`.

use glam::DVec2;
use tilecache::{split_f64_to_f32_pair, TileSlot, Viewport};

/// Per-frame view uniform. Plane coordinates are split into hi/lo float pairs
/// so deep zooms survive the trip to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniform {
    pub origin_hi: [f32; 2],
    pub origin_lo: [f32; 2],
    /// Visible plane width and height.
    pub size: [f32; 2],
    /// Plane size of one tile.
    pub tile_extent: [f32; 2],
}

const _: [(); 32] = [(); core::mem::size_of::<ViewUniform>()];

impl ViewUniform {
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let rect = viewport.rect();
        let (origin_hi, origin_lo) = split_pair(rect.origin);
        let extent = viewport.tile_extent();
        Self {
            origin_hi,
            origin_lo,
            size: [rect.size.x as f32, rect.size.y as f32],
            tile_extent: [extent.x as f32, extent.y as f32],
        }
    }
}

/// One instanced quad per tile slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TileInstance {
    /// Upper-left plane corner of the tile, hi part.
    pub pos_hi: [f32; 2],
    /// Upper-left plane corner of the tile, lo part.
    pub pos_lo: [f32; 2],
    /// Texture-array layer, 0 for the placeholder.
    pub layer: u32,
    pub _pad: u32,
}

const _: [(); 24] = [(); core::mem::size_of::<TileInstance>()];

impl TileInstance {
    pub fn from_slot(slot: &TileSlot) -> Self {
        let (pos_hi, pos_lo) = split_pair(slot.plane_position());
        Self {
            pos_hi,
            pos_lo,
            layer: slot.state().layer_or_zero(),
            _pad: 0,
        }
    }
}

fn split_pair(v: DVec2) -> ([f32; 2], [f32; 2]) {
    let (hx, lx) = split_f64_to_f32_pair(v.x);
    let (hy, ly) = split_f64_to_f32_pair(v.y);
    ([hx, hy], [lx, ly])
}
