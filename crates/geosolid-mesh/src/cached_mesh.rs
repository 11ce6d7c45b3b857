//! Immutable canonical mesh data shared through the geometry cache.

use glam::{Vec2, Vec3};

use crate::kind::{Facing, MeshKey, ShapeKind};

/// A tessellated unit shape in canonical object space.
///
/// Built once per [`MeshKey`] and never mutated afterwards; instances share it
/// through an `Arc` handed out by the geometry cache.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedMesh {
    key: MeshKey,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Option<Vec<[f32; 2]>>,
    indices: Vec<u32>,
}

impl CachedMesh {
    /// Assemble a mesh from raw parts.
    ///
    /// # Panics
    ///
    /// Panics if the attribute arrays differ in length, the index count is not a
    /// multiple of three, or an index is out of range.
    pub fn from_parts(
        key: MeshKey,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        texcoords: Option<Vec<[f32; 2]>>,
        indices: Vec<u32>,
    ) -> Self {
        assert_eq!(
            positions.len(),
            normals.len(),
            "one normal per vertex required"
        );
        if let Some(uvs) = &texcoords {
            assert_eq!(positions.len(), uvs.len(), "one texcoord per vertex required");
        }
        assert!(indices.len() % 3 == 0, "index count must be a multiple of 3");
        assert!(
            indices.iter().all(|&i| (i as usize) < positions.len()),
            "index out of range"
        );
        Self {
            key,
            positions,
            normals,
            texcoords,
            indices,
        }
    }

    /// The key this mesh was built for.
    pub fn key(&self) -> MeshKey {
        self.key
    }

    /// Shape kind tag.
    pub fn kind(&self) -> ShapeKind {
        self.key.kind()
    }

    /// Subdivision count the mesh was tessellated at.
    pub fn subdivisions(&self) -> u32 {
        self.key.subdivisions()
    }

    /// Vertex positions in canonical object space.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-vertex unit normals.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Per-vertex texture coordinates, if generated.
    pub fn texcoords(&self) -> Option<&[[f32; 2]]> {
        self.texcoords.as_deref()
    }

    /// Triangle list indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Index data as raw bytes for GPU upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns `true` if the mesh has both vertices and triangles to draw.
    pub fn has_geometry(&self) -> bool {
        !self.positions.is_empty() && !self.indices.is_empty()
    }

    /// Approximate heap footprint in bytes, used for cache accounting.
    pub fn size_in_bytes(&self) -> u64 {
        let vec3 = std::mem::size_of::<Vec3>();
        let uv = std::mem::size_of::<[f32; 2]>();
        let bytes = self.positions.len() * vec3
            + self.normals.len() * vec3
            + self.texcoords.as_ref().map_or(0, |t| t.len() * uv)
            + self.indices.len() * std::mem::size_of::<u32>();
        bytes as u64
    }
}

/// Incremental mesh construction used by the tessellators.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty builder with room for the given counts.
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            texcoords: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.texcoords.push(uv.to_array());
        index
    }

    /// Append a triangle, wound counter-clockwise as seen from its front side.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of vertices pushed so far.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Finish the mesh for `key`, flipping normals and winding for inside facing.
    pub fn finish(mut self, key: MeshKey) -> CachedMesh {
        if key.facing() == Facing::Inside {
            for n in &mut self.normals {
                *n = -*n;
            }
            for tri in self.indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }
        CachedMesh::from_parts(
            key,
            self.positions,
            self.normals,
            Some(self.texcoords),
            self.indices,
        )
    }
}
