//! The rendering orchestrator. Owns the GPU context, the tile texture array
//! and the tile pipeline.

pub mod context;
pub mod pipelines;
pub mod textures;
pub mod types;

use self::{context::GfxContext, pipelines::tiles::TilePipeline, textures::TileTextures};
use anyhow::Result;
use std::sync::Arc;
use tilecache::{TileCache, Viewport};
use winit::window::Window;

/// Shown behind the tiles before the first positioning pass.
const CLEAR: wgpu::Color = wgpu::Color { r: 0.5, g: 0.5, b: 0.5, a: 1.0 };

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub textures: TileTextures,
    pub tiles: TilePipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    /// Builds the GPU side for a fixed tile pool of `cache`.
    pub async fn new(window: Arc<Window>, cache: &TileCache) -> Result<Self> {
        let gfx = GfxContext::new(window).await?;

        let textures = TileTextures::new(&gfx.device, cache.tile_px(), cache.layer_count())?;
        let tiles = TilePipeline::new(&gfx.device, gfx.config.format, &textures, cache.len());

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            textures,
            tiles,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
        }
    }

    /// Records the tile pass into `encoder`.
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        swap_view: &wgpu::TextureView,
        viewport: &Viewport,
        cache: &TileCache,
    ) {
        self.tiles.update(&self.gfx.queue, viewport, cache);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Tile Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: swap_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.tiles.draw(&mut pass);
    }
}
