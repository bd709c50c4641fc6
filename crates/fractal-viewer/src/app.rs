use crate::{
    config::Settings,
    controls::Controls,
    hud::{self, FpsCounter, HudStats},
    renderer::Renderer,
};
use anyhow::Result;
use glam::{DVec2, UVec2};
use std::{sync::Arc, time::Duration};
use tilecache::{
    Action, Clock, Explorer, GridGeometry, MonotonicClock, Scheduler, TickReport, TileCache, Viewport,
};
use winit::{event::WindowEvent, window::Window};

pub struct App {
    pub renderer: Renderer,
    pub explorer: Explorer,
    pub controls: Controls,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    clock: MonotonicClock,
    fps: FpsCounter,
    last_frame: Duration,
    last_tick: TickReport,
    hud_visible: bool,
    quit: bool,
}

impl App {
    pub async fn new(window: Arc<Window>, settings: Settings) -> Result<Self> {
        let size = window.inner_size();
        let window_px = UVec2::new(size.width.max(1), size.height.max(1));

        // The grid is sized once for the initial framebuffer and never changes.
        let grid = GridGeometry::for_window(window_px, settings.tile_px)?;
        let viewport = Viewport::new(settings.view, grid, window_px)?;
        let cache = TileCache::new(grid, settings.tile_px, settings.reserve_multiplier)?;
        let scheduler = Scheduler::new(settings.budget, settings.fill)?;
        let mut explorer = Explorer::new(viewport, cache, scheduler, settings.steps)?;

        let renderer = Renderer::new(window.clone(), explorer.cache()).await?;
        let clock = MonotonicClock::new();

        let last_tick = {
            let mut sink = renderer.textures.uploader(&renderer.gfx.queue);
            explorer.prime(&mut sink);
            if settings.drain_on_start {
                let report = explorer.drain(&clock, &mut sink);
                log::info!(
                    "initial grid drained: {} tiles in {:.1} ms",
                    report.filled,
                    report.elapsed.as_secs_f64() * 1e3
                );
                report
            } else {
                TickReport::default()
            }
        };

        log::info!(
            "{}x{} px window, budget {:?}, depth {}, {:?} precision",
            window_px.x,
            window_px.y,
            explorer.scheduler().budget(),
            explorer.scheduler().params().depth,
            explorer.scheduler().params().precision
        );

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            explorer,
            controls: Controls::new(),
            egui_ctx,
            egui_state,
            last_frame: clock.now(),
            clock,
            fps: FpsCounter::default(),
            last_tick,
            hud_visible: settings.hud,
            quit: false,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.explorer
                .resize(UVec2::new(new_size.width, new_size.height));
        }
    }

    /// Returns true if the event was consumed by the overlay.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.controls.handle_event(event);

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    #[inline]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Applies this frame's input, then spends the frame budget on tiles.
    pub fn update(&mut self) {
        let frame = self.controls.take_frame();

        for action in frame.pressed {
            match action {
                Action::Quit => self.quit = true,
                Action::ToggleHud => self.hud_visible = !self.hud_visible,
                _ => {
                    self.explorer.apply(action);
                }
            }
        }

        if frame.drag_px != DVec2::ZERO {
            self.explorer.drag(frame.drag_px);
        }
        if frame.drag_released && self.explorer.end_drag() {
            log::debug!("drag ended outside the tile grid");
        }

        if frame.zoom_steps != 0.0 {
            if let Err(err) = self.explorer.zoom_steps_at(frame.zoom_steps, frame.cursor_px) {
                log::warn!("wheel zoom ignored: {}", err);
            }
        }

        let mut sink = self.renderer.textures.uploader(&self.renderer.gfx.queue);
        self.last_tick = self.explorer.tick(&self.clock, &mut sink);
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let now = self.clock.now();
        self.fps.frame(now.saturating_sub(self.last_frame));
        self.last_frame = now;

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.renderer.render(
            &mut encoder,
            &swap_view,
            self.explorer.viewport(),
            self.explorer.cache(),
        );

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        if self.hud_visible {
            let cache = self.explorer.cache();
            let stats = HudStats {
                view: *self.explorer.viewport().rect(),
                computed: cache.computed_count(),
                total: cache.len(),
                last_tick: self.last_tick,
                fps: self.fps.fps(),
            };
            hud::draw_hud(&self.egui_ctx, &stats);
        }

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);
        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
