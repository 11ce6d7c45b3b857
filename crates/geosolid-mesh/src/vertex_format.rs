//! Interleaved vertex format and `wgpu` layout for shape meshes.
//!
//! | Location | Offset | Format    | Field    |
//! |----------|--------|-----------|----------|
//! | 0        | 0      | Float32x3 | position |
//! | 1        | 12     | Float32x3 | normal   |
//! | 2        | 24     | Float32x2 | uv       |

use std::mem;

use bytemuck::{Pod, Zeroable};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::cached_mesh::CachedMesh;

/// One vertex of a shape mesh as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

static_assertions::assert_eq_size!(ShapeVertex, [u8; 32]);

impl ShapeVertex {
    /// Interleave a cached mesh's attribute arrays. Missing texture
    /// coordinates become `[0, 0]`.
    pub fn interleave(mesh: &CachedMesh) -> Vec<ShapeVertex> {
        let uvs = mesh.texcoords();
        mesh.positions()
            .iter()
            .zip(mesh.normals())
            .enumerate()
            .map(|(i, (p, n))| ShapeVertex {
                position: p.to_array(),
                normal: n.to_array(),
                uv: uvs.map_or([0.0, 0.0], |t| t[i]),
            })
            .collect()
    }
}

/// Vertex attributes covering all 32 bytes of [`ShapeVertex`].
pub const SHAPE_VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1,
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2,
    },
];

/// The vertex buffer layout for shape render pipelines.
pub const SHAPE_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: mem::size_of::<ShapeVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &SHAPE_VERTEX_ATTRIBUTES,
};

const _: () = assert!(SHAPE_VERTEX_ATTRIBUTES[1].offset == mem::offset_of!(ShapeVertex, normal) as u64);
const _: () = assert!(SHAPE_VERTEX_ATTRIBUTES[2].offset == mem::offset_of!(ShapeVertex, uv) as u64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{MeshKey, ShapeKind};
    use crate::tessellate;

    #[test]
    fn test_layout_stride_matches_vertex_size() {
        assert_eq!(SHAPE_VERTEX_LAYOUT.array_stride, 32);
        assert_eq!(SHAPE_VERTEX_LAYOUT.attributes.len(), 3);
    }

    #[test]
    fn test_interleave_preserves_attributes() {
        let mesh = tessellate(MeshKey::new(ShapeKind::Pyramid, 0));
        let vertices = ShapeVertex::interleave(&mesh);
        assert_eq!(vertices.len(), mesh.vertex_count());
        assert_eq!(vertices[5].position, mesh.positions()[5].to_array());
        assert_eq!(vertices[5].normal, mesh.normals()[5].to_array());
        assert_eq!(vertices[5].uv, mesh.texcoords().unwrap()[5]);
    }

    #[test]
    fn test_interleaved_bytes() {
        let mesh = tessellate(MeshKey::new(ShapeKind::Ellipsoid, 1));
        let vertices = ShapeVertex::interleave(&mesh);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), mesh.vertex_count() * 32);
    }
}
