//! Rendering side of procedural shapes: camera and frustum math in f64 world
//! space, the [`GpuBackend`] seam that owns vertex/index buffers and receives
//! draw calls, per-instance GPU buffer management with a dirty flag, and the
//! two backends (wgpu and headless).

pub mod camera;
pub mod frustum;
pub mod gpu;
pub mod headless;
pub mod pipeline;
pub mod shape_buffers;
pub mod texture;
pub mod wgpu_backend;

pub use camera::{Camera, Projection};
pub use frustum::Frustum;
pub use gpu::{BufferUsage, Color, DrawCall, DrawStyle, GpuBackend};
pub use headless::{HeadlessBackend, HeadlessBuffer, HeadlessStats, RecordedDraw};
pub use pipeline::{SHAPE_SHADER_SOURCE, ShapePipeline, ShapeUniform};
pub use shape_buffers::{ShapeBuffers, UploadOutcome};
pub use texture::{NoTextures, StaticTextures, TextureId, TextureProvider, TextureRef};
pub use wgpu_backend::{RenderContextError, WgpuBackend, WgpuBuffer, request_device};
