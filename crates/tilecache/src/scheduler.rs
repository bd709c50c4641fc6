//! Deadline-aware incremental filling of the tile cache.
//!
//! One `tick` per frame. A pending reposition always runs first and on its own;
//! otherwise unassigned slots are filled in scan order until the frame budget is
//! spent. A tile fill is never interrupted, so a tick can run over the budget by
//! at most one tile.

use crate::error::TileError;
use crate::fill::FillParams;
use crate::grid::TileCache;
use crate::viewport::Viewport;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

/// Value shown in the placeholder layer and in not-yet-computed slots.
pub const PLACEHOLDER_VALUE: f32 = 0.5;

/// A monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed epoch.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Receives finished tiles, usually a GPU texture array.
pub trait LayerSink {
    /// Replaces one layer with a `px_w * px_h` tile buffer.
    fn upload_layer(&mut self, layer: NonZeroU32, pixels: &[f32], px_w: u32, px_h: u32);

    /// Replaces every layer at once; `pixels` holds all layers back to back,
    /// starting with the placeholder layer 0.
    fn upload_full(&mut self, pixels: &[f32]);
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// The tick was spent on the positioning pass.
    pub repositioned: bool,
    /// Tiles filled and uploaded.
    pub filled: usize,
    /// Slots still unassigned after the tick.
    pub remaining: usize,
    pub elapsed: Duration,
}

impl TickReport {
    /// Nothing was left to do.
    #[inline]
    pub fn is_idle(&self) -> bool {
        !self.repositioned && self.filled == 0 && self.remaining == 0
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    budget: Duration,
    params: FillParams,
    // Progress since the last positioning pass, for the completion log line.
    ticks: u32,
    fill_time: Duration,
}

impl Scheduler {
    pub fn new(budget: Duration, params: FillParams) -> Result<Self, TileError> {
        if budget.is_zero() {
            return Err(TileError::ZeroBudget);
        }
        Ok(Self {
            budget,
            params,
            ticks: 0,
            fill_time: Duration::ZERO,
        })
    }

    #[inline]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    #[inline]
    pub fn params(&self) -> FillParams {
        self.params
    }

    pub fn set_params(&mut self, params: FillParams) {
        self.params = params;
    }

    /// Uploads the placeholder value into every layer.
    pub fn prime<S: LayerSink>(&self, cache: &TileCache, sink: &mut S) {
        let px = cache.tile_px();
        let len = px.x as usize * px.y as usize * cache.layer_count() as usize;
        sink.upload_full(&vec![PLACEHOLDER_VALUE; len]);
    }

    /// Runs one frame's worth of work within the configured budget.
    pub fn tick<C: Clock, S: LayerSink>(
        &mut self,
        cache: &mut TileCache,
        viewport: &Viewport,
        clock: &C,
        sink: &mut S,
    ) -> TickReport {
        self.run(cache, viewport, clock, sink, Some(self.budget))
    }

    /// Fills every outstanding slot regardless of time, repositioning first if needed.
    pub fn drain<C: Clock, S: LayerSink>(
        &mut self,
        cache: &mut TileCache,
        viewport: &Viewport,
        clock: &C,
        sink: &mut S,
    ) -> TickReport {
        let mut report = TickReport::default();
        if cache.needs_reposition() {
            report.repositioned = self.run(cache, viewport, clock, sink, None).repositioned;
        }

        let fill = self.run(cache, viewport, clock, sink, None);
        report.filled = fill.filled;
        report.remaining = fill.remaining;
        report.elapsed = fill.elapsed;
        report
    }

    fn run<C: Clock, S: LayerSink>(
        &mut self,
        cache: &mut TileCache,
        viewport: &Viewport,
        clock: &C,
        sink: &mut S,
        budget: Option<Duration>,
    ) -> TickReport {
        let start = clock.now();

        if cache.needs_reposition() {
            cache.position_slots(viewport);
            self.ticks = 0;
            self.fill_time = Duration::ZERO;

            let elapsed = clock.now().saturating_sub(start);
            log::debug!("repositioned {} slots in {:?}", cache.len(), elapsed);
            return TickReport {
                repositioned: true,
                filled: 0,
                remaining: cache.len(),
                elapsed,
            };
        }

        let mut filled = 0;
        while budget.map_or(true, |b| clock.now().saturating_sub(start) < b) {
            let Some(index) = cache.next_unassigned() else {
                break;
            };

            let layer = TileCache::layer_for(index);
            let px = cache.tile_px();
            let pixels = cache.fill_slot(index, self.params);
            sink.upload_layer(layer, pixels, px.x, px.y);
            cache.mark_computed(index, layer);
            filled += 1;
        }

        let elapsed = clock.now().saturating_sub(start);
        let remaining = cache.len() - cache.computed_count();

        if filled > 0 {
            self.ticks += 1;
            self.fill_time += elapsed;
            log::trace!("tick: filled {} tiles in {:?}, {} remaining", filled, elapsed, remaining);

            if remaining == 0 {
                log::debug!(
                    "grid complete: {} tiles over {} ticks, {:?} filling",
                    cache.len(),
                    self.ticks,
                    self.fill_time
                );
            }
        }

        TickReport {
            repositioned: false,
            filled,
            remaining,
            elapsed,
        }
    }
}
