//! End-to-end behaviour of the cache driven through the public API.

use glam::{DVec2, UVec2};
use std::cell::Cell;
use std::num::NonZeroU32;
use std::time::Duration;
use tilecache::{
    Clock, Explorer, FillParams, GridGeometry, LayerSink, NavSteps, PlaneRect, Precision, Scheduler, SlotState,
    TileCache, ViewChange, Viewport, PLACEHOLDER_VALUE,
};

#[derive(Default)]
struct StepClock(Cell<Duration>);

impl Clock for StepClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Keeps a CPU copy of every layer, like a texture array would.
struct MirrorSink<'a> {
    clock: &'a StepClock,
    cost: Duration,
    layer_len: usize,
    layers: Vec<f32>,
    uploads: Vec<u32>,
}

impl<'a> MirrorSink<'a> {
    fn new(clock: &'a StepClock, cost: Duration, layer_len: usize) -> Self {
        Self {
            clock,
            cost,
            layer_len,
            layers: Vec::new(),
            uploads: Vec::new(),
        }
    }

    fn layer(&self, layer: u32) -> &[f32] {
        let start = layer as usize * self.layer_len;
        &self.layers[start..start + self.layer_len]
    }
}

impl LayerSink for MirrorSink<'_> {
    fn upload_layer(&mut self, layer: NonZeroU32, pixels: &[f32], px_w: u32, px_h: u32) {
        assert_eq!((px_w * px_h) as usize, self.layer_len);
        let start = layer.get() as usize * self.layer_len;
        self.layers[start..start + self.layer_len].copy_from_slice(pixels);
        self.uploads.push(layer.get());
        self.clock.0.set(self.clock.0.get() + self.cost);
    }

    fn upload_full(&mut self, pixels: &[f32]) {
        self.layers = pixels.to_vec();
    }
}

const TILE_PX: u32 = 6;

fn explorer(rect: PlaneRect, budget_ms: u64) -> Explorer {
    let grid = GridGeometry::new(4, 4).unwrap();
    let viewport = Viewport::new(rect, grid, UVec2::new(640, 480)).unwrap();
    let cache = TileCache::new(grid, UVec2::splat(TILE_PX), 4).unwrap();
    let params = FillParams {
        depth: 64,
        precision: Precision::Double,
    };
    let scheduler = Scheduler::new(Duration::from_millis(budget_ms), params).unwrap();
    Explorer::new(viewport, cache, scheduler, NavSteps::default()).unwrap()
}

#[test]
fn full_drain_computes_every_slot() {
    let mut ex = explorer(PlaneRect::new(-2.0, -1.5, 3.0, 3.0).unwrap(), 10);
    assert_eq!(ex.viewport().tile_extent(), DVec2::new(0.75, 0.75));

    let clock = StepClock::default();
    let layer_len = (TILE_PX * TILE_PX) as usize;
    let mut sink = MirrorSink::new(&clock, Duration::from_millis(1), layer_len);
    ex.prime(&mut sink);
    assert!(sink.layer(0).iter().all(|&v| v == PLACEHOLDER_VALUE));

    ex.drain(&clock, &mut sink);

    let cache = ex.cache();
    assert_eq!(cache.len(), 25);
    assert!(cache.is_complete());
    assert!(cache.slots().iter().all(|s| s.state().is_computed()));

    let origin = cache.index_of(0, 0).unwrap();
    assert_eq!(cache.slots()[origin].plane_position(), DVec2::new(-2.0, -1.5));

    // Every uploaded layer matches a direct fill at the slot position.
    for (index, slot) in cache.slots().iter().enumerate() {
        let SlotState::Computed(layer) = slot.state() else {
            panic!("slot {index} not computed");
        };
        assert_eq!(layer, TileCache::layer_for(index));

        let expected = tilecache::fill(
            slot.plane_position(),
            DVec2::splat(0.75),
            TILE_PX,
            TILE_PX,
            ex.scheduler().params(),
        );
        assert_eq!(sink.layer(layer.get()), &expected[..], "layer {}", layer);
    }

    // Placeholder layer is never overwritten.
    assert!(sink.layer(0).iter().all(|&v| v == PLACEHOLDER_VALUE));
}

#[test]
fn budgeted_ticks_fill_in_scan_order() {
    let mut ex = explorer(PlaneRect::new(-2.0, -1.5, 3.0, 3.0).unwrap(), 5);
    let clock = StepClock::default();
    let mut sink = MirrorSink::new(&clock, Duration::from_millis(2), (TILE_PX * TILE_PX) as usize);
    ex.prime(&mut sink);

    assert!(ex.tick(&clock, &mut sink).repositioned);

    let mut per_tick = Vec::new();
    loop {
        let report = ex.tick(&clock, &mut sink);
        if report.is_idle() {
            break;
        }
        per_tick.push(report.filled);
    }

    // Starts at 0, 2 and 4 ms fit in a 5 ms budget.
    assert_eq!(per_tick, vec![3, 3, 3, 3, 3, 3, 3, 3, 1]);
    assert_eq!(sink.uploads, (1..=25).collect::<Vec<_>>());
}

#[test]
fn zoom_scenario_invalidates_and_rescales() {
    let mut ex = explorer(PlaneRect::new(-1.8, -1.0, 2.4, 2.0).unwrap(), 10);
    let clock = StepClock::default();
    let mut sink = MirrorSink::new(&clock, Duration::ZERO, (TILE_PX * TILE_PX) as usize);
    ex.prime(&mut sink);
    ex.drain(&clock, &mut sink);

    let change = ex.zoom_at(0.2, DVec2::new(320.0, 240.0)).unwrap();
    assert_eq!(change, ViewChange::Resized);

    let rect = ex.viewport().rect();
    assert!((rect.origin - DVec2::new(-1.56, -0.8)).abs().max_element() < 1e-12);
    assert!((rect.size - DVec2::new(1.92, 1.6)).abs().max_element() < 1e-12);
    assert!(ex.cache().needs_reposition());
    assert_eq!(ex.cache().computed_count(), 0);

    // Next tick repositions at the new scale before anything is filled.
    let report = ex.tick(&clock, &mut sink);
    assert!(report.repositioned);
    let extent = ex.viewport().tile_extent();
    let last = ex.cache().index_of(4, 4).unwrap();
    let expected = ex.viewport().rect().origin + 4.0 * extent;
    assert_eq!(ex.cache().slots()[last].plane_position(), expected);
}

#[test]
fn pan_scenario_moves_origin_without_invalidating() {
    let mut ex = explorer(PlaneRect::new(-2.0, -1.5, 3.0, 3.0).unwrap(), 10);
    let clock = StepClock::default();
    let mut sink = MirrorSink::new(&clock, Duration::ZERO, (TILE_PX * TILE_PX) as usize);
    ex.prime(&mut sink);
    ex.drain(&clock, &mut sink);

    let states: Vec<SlotState> = ex.cache().slots().iter().map(|s| s.state()).collect();
    let generation = ex.cache().generation();

    // Dragging left by 32 px moves the view a fifth of a tile to the right,
    // still inside the boundary column.
    let (w, h) = (640.0, 480.0);
    let (dx, dy) = (-32.0, 0.0);
    let change = ex.drag(DVec2::new(dx, dy));
    assert_eq!(change, ViewChange::Moved);

    let rect = ex.viewport().rect();
    assert!((rect.origin.x - (-2.0 - dx / w * 3.0)).abs() < 1e-12);
    assert!((rect.origin.y - (-1.5 + dy / h * 3.0)).abs() < 1e-12);

    let after: Vec<SlotState> = ex.cache().slots().iter().map(|s| s.state()).collect();
    assert_eq!(states, after);
    assert_eq!(ex.cache().generation(), generation);
    assert!(ex.tick(&clock, &mut sink).is_idle());
}

#[test]
fn sustained_drag_keeps_filling_until_release() {
    let mut ex = explorer(PlaneRect::new(-2.0, -1.5, 3.0, 3.0).unwrap(), 5);
    let clock = StepClock::default();
    let mut sink = MirrorSink::new(&clock, Duration::from_millis(2), (TILE_PX * TILE_PX) as usize);
    ex.prime(&mut sink);
    assert!(ex.tick(&clock, &mut sink).repositioned);

    // Left and up are the directions without a spare row or column.
    let mut filled = 0;
    for frame in 0..30 {
        let delta = if frame % 2 == 0 { DVec2::new(1.0, 0.0) } else { DVec2::new(0.0, 1.0) };
        assert_eq!(ex.drag(delta), ViewChange::Moved);
        let report = ex.tick(&clock, &mut sink);
        assert!(!report.repositioned, "frame {frame} repositioned");
        filled += report.filled;
    }
    assert_eq!(filled, 25);
    assert!(ex.cache().is_complete());
    assert!(!ex.cache().covers(ex.viewport().rect()));

    // Releasing repositions once at the final view.
    assert!(ex.end_drag());
    assert!(ex.tick(&clock, &mut sink).repositioned);
    let origin = ex.cache().index_of(0, 0).unwrap();
    assert_eq!(ex.cache().slots()[origin].plane_position(), ex.viewport().rect().origin);

    ex.drain(&clock, &mut sink);
    assert!(ex.cache().is_complete());
    assert!(ex.cache().covers(ex.viewport().rect()));
}
