//! Ties the viewport, the tile cache and the scheduler together so that every
//! view mutation leaves the cache in a consistent state.

use crate::error::TileError;
use crate::grid::TileCache;
use crate::input::Action;
use crate::scheduler::{Clock, LayerSink, Scheduler, TickReport};
use crate::viewport::{inverse_zoom, ViewChange, Viewport};
use glam::{DVec2, UVec2};

/// Step sizes for discrete navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavSteps {
    /// Fraction of the view removed by one zoom-in step.
    pub zoom: f64,
    /// Fraction of the view moved by one pan step.
    pub pan: f64,
}

impl Default for NavSteps {
    fn default() -> Self {
        Self { zoom: 0.2, pan: 0.1 }
    }
}

const CENTRE: DVec2 = DVec2::splat(0.5);

pub struct Explorer {
    viewport: Viewport,
    cache: TileCache,
    scheduler: Scheduler,
    steps: NavSteps,
    // A drag gesture is in progress; coverage is checked when it ends.
    dragging: bool,
}

impl Explorer {
    pub fn new(viewport: Viewport, cache: TileCache, scheduler: Scheduler, steps: NavSteps) -> Result<Self, TileError> {
        if !steps.zoom.is_finite() || steps.zoom <= 0.0 || steps.zoom >= 1.0 {
            return Err(TileError::ZoomFactor(steps.zoom));
        }
        if viewport.grid() != cache.grid() {
            return Err(TileError::GridMismatch);
        }

        Ok(Self {
            viewport,
            cache,
            scheduler,
            steps,
            dragging: false,
        })
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Applies one discrete action. Actions without a view effect are ignored.
    pub fn apply(&mut self, action: Action) -> ViewChange {
        let size = self.viewport.rect().size;
        let pan = self.steps.pan;

        let change = match action {
            Action::ZoomIn => self.viewport.zoom(self.steps.zoom, CENTRE),
            Action::ZoomOut => self.viewport.zoom(inverse_zoom(self.steps.zoom), CENTRE),
            Action::PanUp => Ok(self.viewport.pan_plane(DVec2::new(0.0, size.y * pan))),
            Action::PanDown => Ok(self.viewport.pan_plane(DVec2::new(0.0, -size.y * pan))),
            Action::PanLeft => Ok(self.viewport.pan_plane(DVec2::new(-size.x * pan, 0.0))),
            Action::PanRight => Ok(self.viewport.pan_plane(DVec2::new(size.x * pan, 0.0))),
            Action::Recalculate => {
                log::info!("forced recalculation");
                self.cache.invalidate_all();
                return ViewChange::Resized;
            }
            Action::ToggleHud | Action::Quit => return ViewChange::Unchanged,
        };

        match change {
            Ok(change) => self.settle(change),
            Err(err) => {
                log::warn!("ignoring {:?}: {}", action, err);
                ViewChange::Unchanged
            }
        }
    }

    /// Zooms around a window pixel (e.g. the cursor).
    pub fn zoom_at(&mut self, factor: f64, cursor_px: DVec2) -> Result<ViewChange, TileError> {
        let anchor = self.viewport.window_fraction(cursor_px).clamp(DVec2::ZERO, DVec2::ONE);
        let change = self.viewport.zoom(factor, anchor)?;
        Ok(self.settle(change))
    }

    /// Zoom steps of the configured size: positive zooms in, negative out.
    pub fn zoom_steps_at(&mut self, steps: f64, cursor_px: DVec2) -> Result<ViewChange, TileError> {
        let factor = 1.0 - (1.0 - self.steps.zoom).powf(steps);
        self.zoom_at(factor, cursor_px)
    }

    /// Pans by a window-pixel drag delta.
    ///
    /// Starts a gesture if none is running. Slots keep their state and keep
    /// filling for the whole gesture, even once the view slides past the
    /// positioned grid; [`Explorer::end_drag`] repositions if needed.
    pub fn drag(&mut self, delta_px: DVec2) -> ViewChange {
        self.dragging = true;
        self.viewport.pan(delta_px)
    }

    /// Ends the current drag gesture. Returns true if the view had left the
    /// positioned grid and a reposition was scheduled.
    pub fn end_drag(&mut self) -> bool {
        if !std::mem::take(&mut self.dragging) {
            return false;
        }
        self.cache.ensure_covers(self.viewport.rect())
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn resize(&mut self, window_px: UVec2) -> ViewChange {
        let change = self.viewport.resize(window_px);
        self.settle(change)
    }

    /// One budgeted scheduler pass.
    pub fn tick<C: Clock, S: LayerSink>(&mut self, clock: &C, sink: &mut S) -> TickReport {
        self.scheduler.tick(&mut self.cache, &self.viewport, clock, sink)
    }

    /// Fills everything now, ignoring the budget.
    pub fn drain<C: Clock, S: LayerSink>(&mut self, clock: &C, sink: &mut S) -> TickReport {
        self.scheduler.drain(&mut self.cache, &self.viewport, clock, sink)
    }

    pub fn prime<S: LayerSink>(&self, sink: &mut S) {
        self.scheduler.prime(&self.cache, sink);
    }

    fn settle(&mut self, change: ViewChange) -> ViewChange {
        match change {
            ViewChange::Resized => self.cache.invalidate_all(),
            ViewChange::Moved => {
                self.cache.ensure_covers(self.viewport.rect());
            }
            ViewChange::Unchanged => {}
        }
        change
    }
}
