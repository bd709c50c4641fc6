//! tilecache: progressive, time-budgeted Mandelbrot tiles for a GPU texture array.
//!
//! - The visible plane rectangle is cut into a fixed `cols x rows` grid.
//! - `(cols + 1) x (rows + 1)` slots cover it, each owning one pixel buffer
//!   and, once computed, one texture-array layer (layer 0 is a placeholder).
//! - Zoom and resize invalidate every slot; pans only move the camera until
//!   the view leaves the positioned grid.
//! - Each frame the scheduler fills unassigned slots in row-major order until
//!   its time budget runs out, uploading each finished tile through a
//!   [`LayerSink`].
//!
//! Points are only classified as escaped (1.0) or bounded (0.0).

pub mod error;
pub mod escape;
pub mod explorer;
pub mod fill;
pub mod grid;
pub mod input;
pub mod scheduler;
pub mod viewport;

pub use error::TileError;
pub use escape::{classify, Classification, Precision};
pub use explorer::{Explorer, NavSteps};
pub use fill::{fill, fill_into, FillParams};
pub use grid::{SlotState, TileCache, TileSlot};
pub use input::{Action, EdgeDetector};
pub use scheduler::{Clock, LayerSink, MonotonicClock, Scheduler, TickReport, PLACEHOLDER_VALUE};
pub use viewport::{GridGeometry, PlaneRect, ViewChange, Viewport};

/// Splits a double into a float pair whose sum recovers most of its precision.
#[inline]
pub fn split_f64_to_f32_pair(v: f64) -> (f32, f32) {
    let hi = v as f32;
    let lo = (v - hi as f64) as f32;
    (hi, lo)
}
