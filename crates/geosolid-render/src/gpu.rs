//! The seam between shape rendering and a graphics API.
//!
//! A [`GpuBackend`] owns buffer creation and receives draw calls. Buffers are
//! owned values of the backend's `Buffer` type: dropping one frees the GPU
//! resource, so a shape instance that goes away cannot leak its buffers.

use glam::DMat4;

use crate::texture::TextureId;

/// What a buffer will be bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Interleaved vertex data.
    Vertex,
    /// `u32` triangle-list indices.
    Index,
}

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    /// A color from its components.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as `[r, g, b, a]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How a draw call shades its triangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawStyle {
    /// Filled triangles, tinted by `color` and optionally textured.
    Interior {
        color: Color,
        texture: Option<TextureId>,
    },
    /// Triangle edges only.
    Outline { color: Color, width: f32 },
}

/// One indexed triangle-list draw.
#[derive(Debug)]
pub struct DrawCall<'a, B> {
    pub vertex_buffer: &'a B,
    pub index_buffer: &'a B,
    pub index_count: u32,
    /// Object-to-world transform in f64 world space.
    pub model: DMat4,
    pub style: DrawStyle,
}

/// A graphics API that can hold shape buffers and draw them.
pub trait GpuBackend {
    /// An owned GPU buffer. Dropping it releases the GPU memory.
    type Buffer;

    /// Create a buffer initialized with `contents`.
    fn create_buffer(&mut self, usage: BufferUsage, label: &str, contents: &[u8]) -> Self::Buffer;

    /// Overwrite the start of an existing buffer. `contents` must fit.
    fn write_buffer(&mut self, buffer: &Self::Buffer, contents: &[u8]);

    /// Allocated size of a buffer in bytes.
    fn buffer_size(&self, buffer: &Self::Buffer) -> u64;

    /// Release a buffer now instead of when it is dropped.
    fn release(&mut self, buffer: Self::Buffer) {
        drop(buffer);
    }

    /// Queue a draw call for the current frame.
    fn draw(&mut self, call: DrawCall<'_, Self::Buffer>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_array() {
        assert_eq!(Color::rgba(0.1, 0.2, 0.3, 0.4).to_array(), [0.1, 0.2, 0.3, 0.4]);
        assert_eq!(Color::WHITE.to_array(), [1.0; 4]);
    }
}
