use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use glam::UVec2;
use std::time::Duration;
use tilecache::{FillParams, NavSteps, PlaneRect, Precision, TileError};

/// `fractal_viewer` - progressive Mandelbrot explorer.
///
/// The view is cut into fixed-size tiles that are computed on the render
/// thread a few at a time, within a per-frame time budget, and streamed into
/// a GPU texture array as they finish.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Initial window width in logical pixels.
    #[arg(long, env = "FRACTAL_WIDTH", default_value_t = 1200)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, env = "FRACTAL_HEIGHT", default_value_t = 800)]
    pub height: u32,

    /// Edge length of one square tile in pixels.
    ///
    /// Together with the window size this fixes the tile grid and the number
    /// of texture-array layers for the whole session.
    #[arg(long, env = "FRACTAL_TILE_PX", default_value_t = 128)]
    pub tile_px: u32,

    /// Maximum escape-time iterations per sample.
    #[arg(long, env = "FRACTAL_DEPTH", default_value_t = 500)]
    pub depth: u32,

    /// Milliseconds per frame spent filling tiles.
    #[arg(long, env = "FRACTAL_BUDGET_MS", default_value_t = 8)]
    pub budget_ms: u64,

    /// Floating-point width used by the escape-time iteration.
    #[arg(long, env = "FRACTAL_PRECISION", value_enum, default_value_t = PrecisionArg::Double)]
    pub precision: PrecisionArg,

    /// Slot pool capacity as a multiple of `cols * rows`.
    #[arg(long, env = "FRACTAL_RESERVE", default_value_t = 4)]
    pub reserve_multiplier: u32,

    /// Fraction of the view removed by one zoom-in step.
    #[arg(long, env = "FRACTAL_ZOOM_STEP", default_value_t = 0.2)]
    pub zoom_step: f64,

    /// Fraction of the view moved by one keyboard pan step.
    #[arg(long, env = "FRACTAL_PAN_STEP", default_value_t = 0.1)]
    pub pan_step: f64,

    /// Initial view as `x,y,width,height`, lower-left corner first.
    #[arg(
        long,
        env = "FRACTAL_VIEW",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [-2.4, -1.2, 3.6, 2.4]
    )]
    pub view: Vec<f64>,

    /// Compute the whole first grid before opening the first frame.
    #[arg(long)]
    pub drain_on_start: bool,

    /// Start with the overlay hidden.
    #[arg(long)]
    pub no_hud: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecisionArg {
    Single,
    Double,
}

impl From<PrecisionArg> for Precision {
    fn from(arg: PrecisionArg) -> Self {
        match arg {
            PrecisionArg::Single => Precision::Single,
            PrecisionArg::Double => Precision::Double,
        }
    }
}

/// Checked runtime parameters derived from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub window: UVec2,
    pub tile_px: UVec2,
    pub view: PlaneRect,
    pub fill: FillParams,
    pub budget: Duration,
    pub reserve_multiplier: u32,
    pub steps: NavSteps,
    pub drain_on_start: bool,
    pub hud: bool,
}

impl Config {
    pub fn validate(&self) -> Result<Settings> {
        if self.width == 0 || self.height == 0 {
            return Err(TileError::EmptyWindow {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        if self.tile_px == 0 {
            return Err(TileError::EmptyTile {
                width: self.tile_px,
                height: self.tile_px,
            }
            .into());
        }
        if self.budget_ms == 0 {
            return Err(TileError::ZeroBudget.into());
        }
        if self.reserve_multiplier == 0 {
            return Err(TileError::ReserveMultiplier(self.reserve_multiplier).into());
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 || self.zoom_step >= 1.0 {
            return Err(TileError::ZoomFactor(self.zoom_step).into());
        }
        if !self.pan_step.is_finite() || self.pan_step <= 0.0 {
            bail!("pan step must be positive (got {})", self.pan_step);
        }

        let [x, y, w, h] = self.view[..] else {
            bail!("--view takes exactly four values, got {}", self.view.len());
        };
        let view = PlaneRect::new(x, y, w, h)?;

        Ok(Settings {
            window: UVec2::new(self.width, self.height),
            tile_px: UVec2::splat(self.tile_px),
            view,
            fill: FillParams {
                depth: self.depth,
                precision: self.precision.into(),
            },
            budget: Duration::from_millis(self.budget_ms),
            reserve_multiplier: self.reserve_multiplier,
            steps: NavSteps {
                zoom: self.zoom_step,
                pan: self.pan_step,
            },
            drain_on_start: self.drain_on_start,
            hud: !self.no_hud,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::try_parse_from(["fractal_viewer"]).unwrap();
        let settings = cfg.validate().unwrap();

        assert_eq!(settings.window, UVec2::new(1200, 800));
        assert_eq!(settings.tile_px, UVec2::splat(128));
        assert_eq!(settings.fill.depth, 500);
        assert_eq!(settings.fill.precision, Precision::Double);
        assert_eq!(settings.budget, Duration::from_millis(8));
        assert_eq!(settings.view, PlaneRect::new(-2.4, -1.2, 3.6, 2.4).unwrap());
        assert!(settings.hud);
        assert!(!settings.drain_on_start);
    }

    #[test]
    fn parses_view_and_flags() {
        let cfg = Config::try_parse_from([
            "fractal_viewer",
            "--view",
            "-0.75,0.1,0.01,0.01",
            "--precision",
            "single",
            "--drain-on-start",
            "--no-hud",
        ])
        .unwrap();
        let settings = cfg.validate().unwrap();

        assert_eq!(settings.view.origin.x, -0.75);
        assert_eq!(settings.view.size.y, 0.01);
        assert_eq!(settings.fill.precision, Precision::Single);
        assert!(settings.drain_on_start);
        assert!(!settings.hud);
    }

    #[test]
    fn view_needs_four_values() {
        let cfg = Config::try_parse_from(["fractal_viewer", "--view", "1,2,3"]).unwrap();
        assert_eq!(cfg.view, vec![1.0, 2.0, 3.0]);
        assert!(cfg.validate().is_err());

        let cfg = Config::try_parse_from(["fractal_viewer", "--view", "1,2,3,4,5"]).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = Config::try_parse_from(["fractal_viewer", "--budget-ms", "0"]).unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::try_parse_from(["fractal_viewer", "--zoom-step", "1.0"]).unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::try_parse_from(["fractal_viewer", "--view", "0,0,0,1"]).unwrap();
        assert!(cfg.validate().is_err());

        let cfg = Config::try_parse_from(["fractal_viewer", "--tile-px", "0"]).unwrap();
        assert!(cfg.validate().is_err());
    }
}
