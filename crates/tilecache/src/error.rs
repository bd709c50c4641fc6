//! Precondition errors for building the tile cache.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TileError {
    #[error("grid must have at least one column and one row (got {cols}x{rows})")]
    EmptyGrid { cols: u32, rows: u32 },

    #[error("viewport and tile cache disagree on grid geometry")]
    GridMismatch,

    #[error("tile pixel size must be non-zero (got {width}x{height})")]
    EmptyTile { width: u32, height: u32 },

    #[error("viewport size must be positive and finite (got {width} x {height})")]
    DegenerateViewport { width: f64, height: f64 },

    #[error("window size must be non-zero (got {width}x{height})")]
    EmptyWindow { width: u32, height: u32 },

    #[error("zoom factor {0} would collapse the viewport; it must be below 1")]
    ZoomFactor(f64),

    #[error("frame budget must be non-zero")]
    ZeroBudget,

    #[error("reserve multiplier must be at least 1 (got {0})")]
    ReserveMultiplier(u32),

    #[error("tile pool of {needed} layers exceeds the limit of {limit}")]
    LayerLimit { needed: u32, limit: u32 },
}
