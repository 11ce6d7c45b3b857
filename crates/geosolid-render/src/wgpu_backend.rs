//! [`GpuBackend`] on top of wgpu.
//!
//! Draw calls are recorded during the frame together with their per-draw
//! uniforms, then replayed into a render pass by [`WgpuBackend::encode`].

use std::num::NonZeroU64;

use glam::{DVec3, Mat4};
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::gpu::{BufferUsage, DrawCall, DrawStyle, GpuBackend};
use crate::pipeline::{ShapePipeline, ShapeUniform};
use crate::texture::TextureId;

/// Error type for device acquisition.
#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Request a device without a surface, enabling line polygon mode when the
/// adapter supports it.
pub async fn request_device() -> Result<(wgpu::Device, wgpu::Queue), RenderContextError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|_| RenderContextError::NoAdapter)?;

    let info = adapter.get_info();
    tracing::info!(
        name = %info.name,
        backend = ?info.backend,
        device_type = ?info.device_type,
        "selected GPU"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("geosolid-device"),
            required_features: adapter.features() & wgpu::Features::POLYGON_MODE_LINE,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok((device, queue))
}

/// A wgpu buffer owned by one shape instance.
#[derive(Debug)]
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    usage: BufferUsage,
}

impl WgpuBuffer {
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    pub fn raw(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

struct PendingDraw {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    uniform_offset: u32,
    texture: usize,
    outline: bool,
}

/// Draws shapes through a [`ShapePipeline`].
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: ShapePipeline,
    sampler: wgpu::Sampler,
    /// Texture bind groups indexed by [`TextureId`]; slot 0 is plain white.
    textures: Vec<wgpu::BindGroup>,
    eye: DVec3,
    relative_view_projection: Mat4,
    uniforms: Vec<u8>,
    pending: Vec<PendingDraw>,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u64,
}

impl WgpuBackend {
    /// Create the backend and its pipelines for the given target formats.
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let pipeline = ShapePipeline::new(&device, color_format, depth_format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shape-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let uniform_capacity = 64 * ShapeUniform::STRIDE;
        let (uniform_buffer, uniform_bind_group) =
            create_uniforms(&device, &pipeline, uniform_capacity);

        let mut backend = Self {
            device,
            queue,
            pipeline,
            sampler,
            textures: Vec::new(),
            eye: DVec3::ZERO,
            relative_view_projection: Mat4::IDENTITY,
            uniforms: Vec::new(),
            pending: Vec::new(),
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
        };
        let white = backend.create_white_texture();
        backend.register_texture(&white);
        backend
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Make a texture view bindable by shapes.
    pub fn register_texture(&mut self, view: &wgpu::TextureView) -> TextureId {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shape-texture-bind-group"),
            layout: &self.pipeline.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.textures.push(bind_group);
        TextureId((self.textures.len() - 1) as u32)
    }

    /// Start recording a frame seen from `camera`. Drops anything recorded
    /// but not encoded.
    pub fn begin_frame(&mut self, camera: &Camera) {
        self.eye = camera.position;
        self.relative_view_projection = camera.relative_view_projection();
        self.uniforms.clear();
        self.pending.clear();
    }

    /// Number of draws recorded this frame.
    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    /// Upload this frame's uniforms and replay the recorded draws into `pass`.
    pub fn encode(&mut self, pass: &mut wgpu::RenderPass<'_>) {
        if self.pending.is_empty() {
            return;
        }
        let needed = self.uniforms.len() as u64;
        if needed > self.uniform_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = create_uniforms(&self.device, &self.pipeline, capacity);
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
            self.uniform_capacity = capacity;
            tracing::debug!(capacity, "grew shape uniform buffer");
        }
        self.queue.write_buffer(&self.uniform_buffer, 0, &self.uniforms);

        for draw in self.pending.drain(..) {
            let pipeline = if draw.outline {
                match &self.pipeline.outline {
                    Some(p) => p,
                    None => continue,
                }
            } else {
                &self.pipeline.fill
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
            pass.set_bind_group(1, &self.textures[draw.texture], &[]);
            pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
            pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..draw.index_count, 0, 0..1);
        }
        self.uniforms.clear();
    }

    fn create_white_texture(&self) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shape-white-texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255, 255, 255, 255],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: None,
            },
            size,
        );
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn create_uniforms(
    device: &wgpu::Device,
    pipeline: &ShapePipeline,
    capacity: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("shape-uniforms"),
        size: capacity,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("shape-uniform-bind-group"),
        layout: &pipeline.uniform_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<ShapeUniform>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

impl GpuBackend for WgpuBackend {
    type Buffer = WgpuBuffer;

    fn create_buffer(&mut self, usage: BufferUsage, label: &str, contents: &[u8]) -> WgpuBuffer {
        let usages = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usages | wgpu::BufferUsages::COPY_DST,
            });
        WgpuBuffer { buffer, usage }
    }

    fn write_buffer(&mut self, buffer: &WgpuBuffer, contents: &[u8]) {
        self.queue.write_buffer(&buffer.buffer, 0, contents);
    }

    fn buffer_size(&self, buffer: &WgpuBuffer) -> u64 {
        buffer.buffer.size()
    }

    fn release(&mut self, buffer: WgpuBuffer) {
        buffer.buffer.destroy();
    }

    fn draw(&mut self, call: DrawCall<'_, WgpuBuffer>) {
        let (color, texture, line_width, outline) = match call.style {
            DrawStyle::Interior { color, texture } => (
                color,
                texture.map_or(0, |id| id.0 as usize),
                0.0,
                false,
            ),
            DrawStyle::Outline { color, width } => (color, 0, width, true),
        };
        let texture = if texture < self.textures.len() {
            texture
        } else {
            tracing::warn!(texture, "unknown texture id, drawing untextured");
            0
        };

        let uniform = ShapeUniform::new(
            self.relative_view_projection,
            self.eye,
            call.model,
            color.to_array(),
            texture != 0,
            line_width,
        );
        let offset = self.uniforms.len();
        self.uniforms.extend_from_slice(bytemuck::bytes_of(&uniform));
        self.uniforms
            .resize(offset + ShapeUniform::STRIDE as usize, 0);

        self.pending.push(PendingDraw {
            vertex_buffer: call.vertex_buffer.buffer.clone(),
            index_buffer: call.index_buffer.buffer.clone(),
            index_count: call.index_count,
            uniform_offset: offset as u32,
            texture,
            outline,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::Color;
    use crate::shape_buffers::{ShapeBuffers, UploadOutcome};
    use geosolid_mesh::{MeshKey, ShapeKind, tessellate};
    use glam::DMat4;

    fn test_backend() -> Option<WgpuBackend> {
        let (device, queue) = pollster::block_on(request_device()).ok()?;
        Some(WgpuBackend::new(
            device,
            queue,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            Some(wgpu::TextureFormat::Depth32Float),
        ))
    }

    #[test]
    fn test_upload_creates_sized_buffers() {
        let Some(mut gpu) = test_backend() else {
            return; // graceful skip when no GPU
        };
        let mesh = tessellate(MeshKey::new(ShapeKind::Pyramid, 0));
        let mut buffers = ShapeBuffers::new();
        buffers.select(mesh.key());
        assert_eq!(buffers.sync(&mut gpu, &mesh), UploadOutcome::Allocated);
        assert_eq!(
            buffers.gpu_bytes(&gpu),
            (mesh.vertex_count() * 32 + mesh.index_count() * 4) as u64
        );
    }

    #[test]
    fn test_reupload_reuses_buffers_when_fits() {
        let Some(mut gpu) = test_backend() else {
            return;
        };
        let mut buffers = ShapeBuffers::new();
        let big = tessellate(MeshKey::new(ShapeKind::Ellipsoid, 3));
        let small = tessellate(MeshKey::new(ShapeKind::Ellipsoid, 1));
        buffers.select(big.key());
        buffers.sync(&mut gpu, &big);
        buffers.select(small.key());
        assert_eq!(buffers.sync(&mut gpu, &small), UploadOutcome::Rewritten);
    }

    #[test]
    fn test_records_and_encodes_draws() {
        let Some(mut gpu) = test_backend() else {
            return;
        };
        let mesh = tessellate(MeshKey::new(ShapeKind::Ellipsoid, 1));
        let mut buffers = ShapeBuffers::new();
        buffers.select(mesh.key());
        buffers.sync(&mut gpu, &mesh);

        let mut camera = Camera::default();
        camera.look_at(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Y);
        gpu.begin_frame(&camera);
        let style = DrawStyle::Interior {
            color: Color::WHITE,
            texture: None,
        };
        assert!(buffers.draw(&mut gpu, DMat4::IDENTITY, style));
        assert!(buffers.draw(&mut gpu, DMat4::from_translation(DVec3::X), style));
        assert_eq!(gpu.pending_draws(), 2);

        let size = wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        };
        let color = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("test-color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("test-depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("test-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            gpu.encode(&mut pass);
        }
        gpu.queue().submit(std::iter::once(encoder.finish()));
        assert_eq!(gpu.pending_draws(), 0);
    }
}
