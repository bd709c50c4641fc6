// Draws every tile slot as an instanced quad textured from its array layer.

use crate::renderer::textures::TileTextures;
use crate::renderer::types::{TileInstance, ViewUniform};
use tilecache::{TileCache, Viewport};
use wgpu::util::DeviceExt;

pub struct TilePipeline {
    pipeline:        wgpu::RenderPipeline,
    view_bind:       wgpu::BindGroup,
    tiles_bind:      wgpu::BindGroup,
    uniform_buffer:  wgpu::Buffer,
    quad_vb:         wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count:  u32,
    last_uniform:    Option<ViewUniform>,
    last_generation: Option<u64>,
}

impl TilePipeline {
    pub fn new(
        device:     &wgpu::Device,
        color_fmt:  wgpu::TextureFormat,
        textures:   &TileTextures,
        slot_count: usize,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Tile View Uniform"),
            size:               std::mem::size_of::<ViewUniform>() as u64,
            usage:              wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Tile View BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty:                 wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size:   wgpu::BufferSize::new(
                        std::mem::size_of::<ViewUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        // R32Float is not filterable; the shader uses textureLoad only.
        let tiles_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label:   Some("Tile Array BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding:    0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type:    wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                    multisampled:   false,
                },
                count: None,
            }],
        });

        let view_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Tile View Bind Group"),
            layout:  &view_layout,
            entries: &[wgpu::BindGroupEntry {
                binding:  0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let tiles_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label:   Some("Tile Array Bind Group"),
            layout:  &tiles_layout,
            entries: &[wgpu::BindGroupEntry {
                binding:  0,
                resource: wgpu::BindingResource::TextureView(&textures.view),
            }],
        });

        // Unit quad, (0,0) at the tile's upper-left corner, v growing downward.
        let corners: [[f32; 2]; 6] = [
            [0.0, 0.0], [1.0, 0.0], [1.0, 1.0],
            [0.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label:    Some("Tile Quad VB"),
            contents: bytemuck::cast_slice(&corners),
            usage:    wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label:              Some("Tile Instances"),
            size:               (slot_count.max(1) * std::mem::size_of::<TileInstance>()) as u64,
            usage:              wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label:  Some("Tiles WGSL"),
            source: wgpu::ShaderSource::Wgsl(TILES_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label:                Some("Tile Pipeline Layout"),
            bind_group_layouts:   &[&view_layout, &tiles_layout],
            push_constant_ranges: &[],
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode:    wgpu::VertexStepMode::Vertex,
                attributes:   &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset:          0,
                    format:          wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<TileInstance>() as u64,
                step_mode:    wgpu::VertexStepMode::Instance,
                attributes:   &[
                    // pos_hi
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset:          0,
                        format:          wgpu::VertexFormat::Float32x2,
                    },
                    // pos_lo
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset:          8,
                        format:          wgpu::VertexFormat::Float32x2,
                    },
                    // layer
                    wgpu::VertexAttribute {
                        shader_location: 3,
                        offset:          16,
                        format:          wgpu::VertexFormat::Uint32,
                    },
                ],
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label:  Some("Tile Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module:              &shader,
                entry_point:         "vs_main",
                buffers:             &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            fragment: Some(wgpu::FragmentState {
                module:      &shader,
                entry_point: "fs_main",
                targets:     &[Some(wgpu::ColorTargetState {
                    format:     color_fmt,
                    blend:      None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview:   None,
        });

        Self {
            pipeline,
            view_bind,
            tiles_bind,
            uniform_buffer,
            quad_vb,
            instance_buffer,
            instance_count: 0,
            last_uniform: None,
            last_generation: None,
        }
    }

    /// Rewrites the uniform when the view moved and the instances when any
    /// slot changed position or state.
    pub fn update(&mut self, queue: &wgpu::Queue, viewport: &Viewport, cache: &TileCache) {
        let uniform = ViewUniform::from_viewport(viewport);
        if self.last_uniform != Some(uniform) {
            queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
            self.last_uniform = Some(uniform);
        }

        if self.last_generation != Some(cache.generation()) {
            let instances: Vec<TileInstance> =
                cache.slots().iter().map(TileInstance::from_slot).collect();
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
            self.instance_count = instances.len() as u32;
            self.last_generation = Some(cache.generation());
            log::trace!(
                "instances rebuilt: {} slots, generation {}",
                self.instance_count,
                cache.generation()
            );
        }
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.view_bind, &[]);
        rpass.set_bind_group(1, &self.tiles_bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        rpass.draw(0..6, 0..self.instance_count);
    }
}

pub const TILES_WGSL: &str = r#"
struct View {
    origin_hi:   vec2<f32>,
    origin_lo:   vec2<f32>,
    size:        vec2<f32>,
    tile_extent: vec2<f32>,
};
@group(0) @binding(0) var<uniform> V: View;
@group(1) @binding(0) var tiles: texture_2d_array<f32>;

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) layer: u32,
}

@vertex
fn vs_main(
    @location(0) corner: vec2<f32>,
    @location(1) pos_hi: vec2<f32>,
    @location(2) pos_lo: vec2<f32>,
    @location(3) layer:  u32,
) -> VSOut {
    // Subtract hi and lo separately so the large parts cancel first.
    let rel_corner = (pos_hi - V.origin_hi) + (pos_lo - V.origin_lo);
    let rel = rel_corner + vec2<f32>(corner.x, -corner.y) * V.tile_extent;
    let ndc = rel / V.size * 2.0 - 1.0;

    var out: VSOut;
    out.clip = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = corner;
    out.layer = layer;
    return out;
}

@fragment
fn fs_main(in: VSOut) -> @location(0) vec4<f32> {
    let dims = textureDimensions(tiles);
    let texel = min(vec2<u32>(in.uv * vec2<f32>(dims)), dims - vec2<u32>(1u));
    let v = textureLoad(tiles, texel, in.layer, 0).r;
    return vec4<f32>(v, v, v, 1.0);
}
"#;
