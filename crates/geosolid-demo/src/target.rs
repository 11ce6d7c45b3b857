//! Where the demo's frames go: a CPU recorder or an offscreen wgpu target.

use geosolid_render::{
    Camera, GpuBackend, HeadlessBackend, StaticTextures, TextureId, TextureRef, WgpuBackend,
};

use crate::scene::CHECKER_TEXTURE;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A backend plus whatever a frame needs around it.
pub trait FrameTarget {
    type Gpu: GpuBackend;

    fn gpu(&mut self) -> &mut Self::Gpu;

    fn begin_frame(&mut self, camera: &Camera);

    /// Finish the frame and return how many draws it contained.
    fn end_frame(&mut self) -> usize;

    /// Textures this target can bind.
    fn textures(&self) -> StaticTextures;

    fn describe(&self) -> String;
}

#[derive(Default)]
pub struct HeadlessTarget {
    backend: HeadlessBackend,
}

impl HeadlessTarget {
    pub fn new() -> Self {
        Self {
            backend: HeadlessBackend::new(),
        }
    }
}

impl FrameTarget for HeadlessTarget {
    type Gpu = HeadlessBackend;

    fn gpu(&mut self) -> &mut HeadlessBackend {
        &mut self.backend
    }

    fn begin_frame(&mut self, _camera: &Camera) {}

    fn end_frame(&mut self) -> usize {
        self.backend.take_draws().len()
    }

    fn textures(&self) -> StaticTextures {
        let mut textures = StaticTextures::new();
        textures.insert(TextureRef::from(CHECKER_TEXTURE), TextureId(1));
        textures
    }

    fn describe(&self) -> String {
        let stats = self.backend.stats();
        format!(
            "headless: {} buffers created, {} rewrites, {} bytes uploaded, {} live, {} interior + {} outline draws",
            stats.buffers_created,
            stats.buffer_writes,
            stats.bytes_uploaded,
            self.backend.live_buffers(),
            stats.interior_draws,
            stats.outline_draws,
        )
    }
}

/// Renders into offscreen color and depth textures.
pub struct OffscreenTarget {
    backend: WgpuBackend,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    checker: TextureId,
    frames: u64,
}

impl OffscreenTarget {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let color_view = create_attachment(&device, "demo-color", size, COLOR_FORMAT);
        let depth_view = create_attachment(&device, "demo-depth", size, DEPTH_FORMAT);
        let checker_view = create_checker(&device, &queue);

        let mut backend = WgpuBackend::new(device, queue, COLOR_FORMAT, Some(DEPTH_FORMAT));
        let checker = backend.register_texture(&checker_view);
        Self {
            backend,
            color_view,
            depth_view,
            checker,
            frames: 0,
        }
    }
}

impl FrameTarget for OffscreenTarget {
    type Gpu = WgpuBackend;

    fn gpu(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    fn begin_frame(&mut self, camera: &Camera) {
        self.backend.begin_frame(camera);
    }

    fn end_frame(&mut self) -> usize {
        let draws = self.backend.pending_draws();
        let mut encoder =
            self.backend
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("demo-frame"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("demo-shapes"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.03,
                            b: 0.06,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.backend.encode(&mut pass);
        }
        self.backend.queue().submit(std::iter::once(encoder.finish()));
        self.frames += 1;
        draws
    }

    fn textures(&self) -> StaticTextures {
        let mut textures = StaticTextures::new();
        textures.insert(TextureRef::from(CHECKER_TEXTURE), self.checker);
        textures
    }

    fn describe(&self) -> String {
        format!("wgpu: {} frames submitted", self.frames)
    }
}

fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    size: wgpu::Extent3d,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

/// An 8x8 black and white checkerboard.
fn create_checker(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    const SIDE: u32 = 8;
    let size = wgpu::Extent3d {
        width: SIDE,
        height: SIDE,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("demo-checker"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels: Vec<u8> = (0..SIDE * SIDE)
        .flat_map(|i| {
            let v = if (i % SIDE + i / SIDE) % 2 == 0 { 255 } else { 40 };
            [v, v, v, 255]
        })
        .collect();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &texels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(SIDE * 4),
            rows_per_image: None,
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
