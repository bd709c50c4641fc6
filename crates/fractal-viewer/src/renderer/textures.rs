use anyhow::Result;
use glam::UVec2;
use std::num::NonZeroU32;
use tilecache::{LayerSink, TileError};

/// GPU storage for every tile: one `R32Float` array layer per slot, plus the
/// placeholder in layer 0.
pub struct TileTextures {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    tile_px: UVec2,
    layers: u32,
}

impl TileTextures {
    pub fn new(device: &wgpu::Device, tile_px: UVec2, layers: u32) -> Result<Self> {
        let limits = device.limits();
        if layers > limits.max_texture_array_layers {
            return Err(TileError::LayerLimit {
                needed: layers,
                limit: limits.max_texture_array_layers,
            }
            .into());
        }
        let max_dim = limits.max_texture_dimension_2d;
        if tile_px.x > max_dim || tile_px.y > max_dim {
            anyhow::bail!(
                "tile size {}x{} exceeds the texture limit of {}",
                tile_px.x,
                tile_px.y,
                max_dim
            );
        }

        let format = wgpu::TextureFormat::R32Float;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tile Array"),
            size: wgpu::Extent3d {
                width: tile_px.x,
                height: tile_px.y,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Tile Array View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        log::info!(
            "tile array: {} layers of {}x{} {:?}",
            layers,
            tile_px.x,
            tile_px.y,
            format
        );

        Ok(Self {
            texture,
            view,
            tile_px,
            layers,
        })
    }

    /// A [`LayerSink`] writing through `queue`.
    pub fn uploader<'a>(&'a self, queue: &'a wgpu::Queue) -> LayerUploader<'a> {
        LayerUploader {
            textures: self,
            queue,
        }
    }

    fn write_layers(&self, queue: &wgpu::Queue, first: u32, count: u32, pixels: &[f32]) {
        let layer_len = (self.tile_px.x * self.tile_px.y) as usize;
        let expected = layer_len * count as usize;
        if pixels.len() != expected || first + count > self.layers {
            log::error!(
                "dropping upload of {} values into layers {}..{} (expected {} values, {} layers)",
                pixels.len(),
                first,
                first + count,
                expected,
                self.layers
            );
            return;
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: first },
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(pixels),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.tile_px.x * std::mem::size_of::<f32>() as u32),
                rows_per_image: Some(self.tile_px.y),
            },
            wgpu::Extent3d {
                width: self.tile_px.x,
                height: self.tile_px.y,
                depth_or_array_layers: count,
            },
        );
    }
}

/// Short-lived sink handed to the scheduler for one tick.
pub struct LayerUploader<'a> {
    textures: &'a TileTextures,
    queue: &'a wgpu::Queue,
}

impl LayerSink for LayerUploader<'_> {
    fn upload_layer(&mut self, layer: NonZeroU32, pixels: &[f32], px_w: u32, px_h: u32) {
        debug_assert_eq!(UVec2::new(px_w, px_h), self.textures.tile_px);
        self.textures.write_layers(self.queue, layer.get(), 1, pixels);
    }

    fn upload_full(&mut self, pixels: &[f32]) {
        self.textures.write_layers(self.queue, 0, self.textures.layers, pixels);
    }
}
