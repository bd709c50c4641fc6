//! egui overlay with view and tile progress.

use std::time::Duration;
use tilecache::{PlaneRect, TickReport};

/// Everything the overlay shows for one frame.
#[derive(Debug, Clone, Copy)]
pub struct HudStats {
    pub view: PlaneRect,
    pub computed: usize,
    pub total: usize,
    pub last_tick: TickReport,
    pub fps: f64,
}

pub fn draw_hud(ctx: &egui::Context, stats: &HudStats) {
    egui::Window::new("Tiles")
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(8.0, 8.0))
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .show(ctx, |ui| {
            let min = stats.view.origin;
            let max = stats.view.max();
            ui.monospace(format!("re [{:+.12e}, {:+.12e}]", min.x, max.x));
            ui.monospace(format!("im [{:+.12e}, {:+.12e}]", min.y, max.y));
            ui.separator();

            ui.label(format!("tiles {}/{}", stats.computed, stats.total));
            let progress = if stats.total == 0 {
                1.0
            } else {
                stats.computed as f32 / stats.total as f32
            };
            ui.add(egui::ProgressBar::new(progress).desired_width(180.0));
            ui.label(format!(
                "last tick: {} filled in {:.1} ms",
                stats.last_tick.filled,
                stats.last_tick.elapsed.as_secs_f64() * 1e3
            ));
            ui.label(format!("{:.0} fps", stats.fps));
        });
}

/// Frames per second, refreshed once per window.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    acc: Duration,
    frames: u32,
    fps: f64,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            acc: Duration::ZERO,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Records one frame that took `dt`; returns the current estimate.
    pub fn frame(&mut self, dt: Duration) -> f64 {
        self.acc += dt;
        self.frames += 1;
        if self.acc >= self.window {
            self.fps = self.frames as f64 / self.acc.as_secs_f64();
            self.acc = Duration::ZERO;
            self.frames = 0;
        }
        self.fps
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
