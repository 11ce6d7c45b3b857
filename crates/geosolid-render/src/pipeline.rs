//! wgpu render pipelines for shape interiors and outlines.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use geosolid_mesh::SHAPE_VERTEX_LAYOUT;
use glam::{DMat4, DVec3, Mat4};

/// Per-draw uniform data. Draws are packed into one buffer at
/// [`ShapeUniform::STRIDE`] and selected with a dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ShapeUniform {
    /// Eye-relative model-view-projection.
    pub mvp: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix for normals.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: 1.0 if textured, y: outline width in pixels.
    pub params: [f32; 4],
}

impl ShapeUniform {
    /// Distance between consecutive uniforms; the minimum dynamic offset
    /// alignment wgpu guarantees.
    pub const STRIDE: u64 = 256;

    /// Build the uniform for a world-space model matrix seen from `eye`.
    ///
    /// The model translation is made eye-relative in f64 before narrowing,
    /// so shapes far from the world origin keep full f32 precision.
    pub fn new(
        relative_view_projection: Mat4,
        eye: DVec3,
        model: DMat4,
        color: [f32; 4],
        textured: bool,
        line_width: f32,
    ) -> Self {
        let relative = DMat4::from_translation(-eye) * model;
        let model32 = relative.as_mat4();
        let normal_matrix = model32.inverse().transpose();
        Self {
            mvp: (relative_view_projection * model32).to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            color,
            params: [if textured { 1.0 } else { 0.0 }, line_width, 0.0, 0.0],
        }
    }
}

static_assertions::const_assert!(std::mem::size_of::<ShapeUniform>() as u64 <= ShapeUniform::STRIDE);

/// Pipelines and bind group layouts for drawing shapes.
pub struct ShapePipeline {
    pub fill: wgpu::RenderPipeline,
    /// `None` when the device lacks `POLYGON_MODE_LINE`.
    pub outline: Option<wgpu::RenderPipeline>,
    pub uniform_bind_group_layout: wgpu::BindGroupLayout,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
}

impl ShapePipeline {
    /// Create the shape pipelines for the given target formats.
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shape-shader"),
            source: wgpu::ShaderSource::Wgsl(SHAPE_SHADER_SOURCE.into()),
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shape-uniform-bind-group-layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(std::mem::size_of::<ShapeUniform>() as u64),
                    },
                    count: None,
                }],
            });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("shape-texture-bind-group-layout"),
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

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout, &texture_bind_group_layout],
            immediate_size: 0,
        });

        let fill = create_pipeline(
            device,
            &layout,
            &shader,
            color_format,
            depth_format,
            PipelineKind::Fill,
        );
        let outline = device
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE)
            .then(|| {
                create_pipeline(
                    device,
                    &layout,
                    &shader,
                    color_format,
                    depth_format,
                    PipelineKind::Outline,
                )
            });
        if outline.is_none() {
            tracing::info!("POLYGON_MODE_LINE unavailable, shape outlines disabled");
        }

        Self {
            fill,
            outline,
            uniform_bind_group_layout,
            texture_bind_group_layout,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PipelineKind {
    Fill,
    Outline,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    let (label, fragment_entry, polygon_mode, cull_mode) = match kind {
        PipelineKind::Fill => (
            "shape-fill-pipeline",
            "fs_fill",
            wgpu::PolygonMode::Fill,
            Some(wgpu::Face::Back),
        ),
        PipelineKind::Outline => (
            "shape-outline-pipeline",
            "fs_outline",
            wgpu::PolygonMode::Line,
            None,
        ),
    };

    let depth_stencil = depth_format.map(|format| wgpu::DepthStencilState {
        format,
        depth_write_enabled: kind == PipelineKind::Fill,
        depth_compare: wgpu::CompareFunction::GreaterEqual, // reverse-Z
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[SHAPE_VERTEX_LAYOUT],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            unclipped_depth: false,
            polygon_mode,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// WGSL source shared by the fill and outline pipelines.
pub const SHAPE_SHADER_SOURCE: &str = r#"
struct ShapeUniform {
    mvp: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> shape: ShapeUniform;

@group(1) @binding(0)
var shape_texture: texture_2d<f32>;
@group(1) @binding(1)
var shape_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = shape.mvp * vec4<f32>(in.position, 1.0);
    out.normal = (shape.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_fill(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(shape_texture, shape_sampler, in.uv);
    let base = mix(shape.color, shape.color * texel, shape.params.x);
    let n = normalize(in.normal);
    let light = 0.4 + 0.6 * abs(n.z);
    return vec4<f32>(base.rgb * light, base.a);
}

@fragment
fn fs_outline(in: VertexOutput) -> @location(0) vec4<f32> {
    return shape.color;
}
"#;
