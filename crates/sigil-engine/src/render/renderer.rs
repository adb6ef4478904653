use std::collections::HashMap;

use crate::backend::TextureId;
use crate::coords::Mat4;
use crate::paint::{BlendMode, Color};

use super::glyph_atlas::GlyphAtlas;
use super::stream::{DrawStream, TextureSlot, Topology, Vertex};
use super::{RenderCtx, RenderTarget};

const GLOBALS_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;
const VERTEX_SIZE: u64 = std::mem::size_of::<Vertex>() as u64;

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Draws a [`DrawStream`] into a surface frame.
///
/// One pipeline exists per `(topology, blend)` pair; every segment selects
/// one of them plus the bind group of its texture. All pipeline state is
/// created up front when the window opens.
pub struct Renderer {
    pipelines: HashMap<(Topology, BlendMode), wgpu::RenderPipeline>,

    // Kept alive for the bind group.
    _globals_ubo: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    texture_bgl: wgpu::BindGroupLayout,
    repeat_sampler: wgpu::Sampler,

    white: GpuTexture,
    glyphs: GpuTexture,
    images: Vec<GpuTexture>,

    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
    // Largest vertex buffer the device accepts, in vertices.
    max_vertices: usize,
}

impl Renderer {
    pub fn new(ctx: &RenderCtx<'_>, projection: &Mat4, atlas: &GlyphAtlas) -> Self {
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sigil shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sigil.wgsl").into()),
        });

        let globals_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sigil globals bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sigil texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sigil pipeline layout"),
            bind_group_layouts: &[&globals_bgl, &texture_bgl],
            immediate_size: 0,
        });

        let mut pipelines = HashMap::new();
        for topology in Topology::ALL {
            for blend in [BlendMode::Alpha, BlendMode::Additive] {
                let pipeline = create_pipeline(ctx, &shader, &pipeline_layout, topology, blend);
                pipelines.insert((topology, blend), pipeline);
            }
        }

        let globals_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sigil globals ubo"),
            size: GLOBALS_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue.write_buffer(&globals_ubo, 0, bytemuck::bytes_of(&projection.cols));

        let globals_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sigil globals bind group"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_ubo.as_entire_binding(),
            }],
        });

        let repeat_sampler = create_sampler(ctx, "sigil sprite sampler", wgpu::AddressMode::Repeat);
        let clamp_sampler = create_sampler(ctx, "sigil clamp sampler", wgpu::AddressMode::ClampToEdge);

        let white = create_texture(ctx, &texture_bgl, &clamp_sampler, "sigil white", 1, 1, &[255; 4]);
        let glyphs = create_texture(
            ctx,
            &texture_bgl,
            &clamp_sampler,
            "sigil glyph atlas",
            atlas.size(),
            atlas.size(),
            atlas.pixels(),
        );

        Self {
            pipelines,
            _globals_ubo: globals_ubo,
            globals_bind_group,
            texture_bgl,
            repeat_sampler,
            white,
            glyphs,
            images: Vec::new(),
            vbo: None,
            vbo_capacity: 0,
            max_vertices: max_vertices_for(ctx.device.limits().max_buffer_size),
        }
    }

    /// Most vertices one frame can upload on this device.
    #[inline]
    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    /// Uploads straight-alpha RGBA8 pixels and returns the new texture's id.
    pub fn upload_image(&mut self, ctx: &RenderCtx<'_>, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        let id = TextureId(self.images.len() as u32);
        let label = format!("sigil image {}", id.0);
        let texture = create_texture(ctx, &self.texture_bgl, &self.repeat_sampler, &label, width, height, rgba);
        self.images.push(texture);
        id
    }

    /// Copies the glyph atlas to the GPU if it changed since the last call.
    pub fn sync_glyphs(&mut self, ctx: &RenderCtx<'_>, atlas: &mut GlyphAtlas) {
        if !atlas.take_dirty() {
            return;
        }
        write_texels(ctx, &self.glyphs.texture, atlas.size(), atlas.size(), atlas.pixels());
    }

    /// Clears the target to `clear`, then draws every segment of `stream` in order.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, stream: &DrawStream, clear: Color) {
        let vertices = stream.vertices();
        let uploaded = vertices.len().min(self.max_vertices);
        if uploaded < vertices.len() {
            log::warn!("draw stream holds {} vertices; drawing the first {uploaded}", vertices.len());
        }
        if uploaded > 0 {
            self.ensure_vertex_capacity(ctx, uploaded);
            if let Some(vbo) = self.vbo.as_ref() {
                ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&vertices[..uploaded]));
            }
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sigil frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.r as f64,
                        g: clear.g as f64,
                        b: clear.b as f64,
                        a: clear.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(vbo) = self.vbo.as_ref() else { return };
        if uploaded == 0 {
            return;
        }

        rpass.set_bind_group(0, &self.globals_bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));

        for segment in stream.segments() {
            if segment.range.end as usize > uploaded {
                break;
            }
            let Some(pipeline) = self.pipelines.get(&(segment.topology, segment.blend)) else {
                continue;
            };
            let texture = match segment.texture {
                TextureSlot::White => &self.white,
                TextureSlot::Glyphs => &self.glyphs,
                TextureSlot::Image(id) => match self.images.get(id.0 as usize) {
                    Some(t) => t,
                    None => {
                        log::debug!("skipping sprite with unknown texture {}", id.0);
                        continue;
                    }
                },
            };

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.draw(segment.range.clone(), 0..1);
        }
    }

    fn ensure_vertex_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }

        let new_cap = vertex_capacity(required, self.max_vertices);
        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sigil vertex buffer"),
            size: new_cap as u64 * VERTEX_SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }
}

fn max_vertices_for(max_buffer_size: u64) -> usize {
    (max_buffer_size / VERTEX_SIZE).min(u32::MAX as u64) as usize
}

/// Grows in powers of two from 1024 vertices, capped at `max`.
fn vertex_capacity(required: usize, max: usize) -> usize {
    required
        .checked_next_power_of_two()
        .unwrap_or(usize::MAX)
        .max(1024)
        .min(max)
}

fn create_pipeline(
    ctx: &RenderCtx<'_>,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    topology: Topology,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    let label = format!("sigil {topology:?}/{blend:?} pipeline");
    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[Vertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.surface_format,
                blend: Some(blend.wgpu_state()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: topology.wgpu(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

fn create_sampler(ctx: &RenderCtx<'_>, label: &str, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

fn create_texture(
    ctx: &RenderCtx<'_>,
    bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> GpuTexture {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_texels(ctx, &texture, width, height, rgba);

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture { texture, bind_group }
}

fn write_texels(ctx: &RenderCtx<'_>, texture: &wgpu::Texture, width: u32, height: u32, rgba: &[u8]) {
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}
