//! GPU-resident buffers of one shape instance.
//!
//! [`ShapeBuffers`] owns the vertex and index buffers a shape draws from and
//! remembers which mesh they were built from. Selecting a different mesh
//! marks them dirty; the next [`sync`](ShapeBuffers::sync) re-uploads both,
//! writing in place when the data fits.

use geosolid_mesh::{CachedMesh, MeshKey, ShapeVertex};
use glam::DMat4;

use crate::gpu::{BufferUsage, DrawCall, DrawStyle, GpuBackend};

/// What [`ShapeBuffers::sync`] had to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The bound buffers already hold this mesh.
    Unchanged,
    /// The existing buffers were large enough and were overwritten.
    Rewritten,
    /// New buffers were allocated (first upload, or the data grew).
    Allocated,
}

/// Vertex and index buffers of one shape instance plus the dirty flag.
#[derive(Debug)]
pub struct ShapeBuffers<B> {
    vertex_buffer: Option<B>,
    index_buffer: Option<B>,
    bound: Option<MeshKey>,
    index_count: u32,
    vertex_count: u32,
    dirty: bool,
    uploads: u64,
}

impl<B> Default for ShapeBuffers<B> {
    fn default() -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            bound: None,
            index_count: 0,
            vertex_count: 0,
            dirty: false,
            uploads: 0,
        }
    }
}

impl<B> ShapeBuffers<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the mesh selected this frame. Sets the dirty flag when it
    /// differs from the mesh the buffers were built for; an unchanged
    /// selection leaves the flag as it was. Returns the flag.
    pub fn select(&mut self, key: MeshKey) -> bool {
        if self.bound != Some(key) {
            if !self.dirty {
                tracing::trace!(%key, bound = ?self.bound, "shape buffers dirty");
            }
            self.dirty = true;
        }
        self.dirty
    }

    /// Returns `true` if the buffers must be re-uploaded before drawing.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The mesh the buffers currently hold.
    pub fn bound_key(&self) -> Option<MeshKey> {
        self.bound
    }

    /// Returns `true` if both buffers exist.
    pub fn is_resident(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Number of indices drawn from the bound buffers.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Number of vertices in the bound vertex buffer.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// How many times data was sent to the GPU (allocations and rewrites).
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Make the buffers hold `mesh`, re-uploading only if dirty or absent.
    ///
    /// Vertex and index buffers are always refreshed together, since both
    /// come from the same mesh. Clears the dirty flag.
    pub fn sync<G>(&mut self, gpu: &mut G, mesh: &CachedMesh) -> UploadOutcome
    where
        G: GpuBackend<Buffer = B>,
    {
        let key = mesh.key();
        if self.is_resident() && self.bound == Some(key) {
            self.dirty = false;
            return UploadOutcome::Unchanged;
        }

        let vertices = ShapeVertex::interleave(mesh);
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&vertices);
        let index_bytes = mesh.index_bytes();

        let reusable = match (&self.vertex_buffer, &self.index_buffer) {
            (Some(vb), Some(ib))
                if vertex_bytes.len() as u64 <= gpu.buffer_size(vb)
                    && index_bytes.len() as u64 <= gpu.buffer_size(ib) =>
            {
                Some((vb, ib))
            }
            _ => None,
        };

        let outcome = if let Some((vb, ib)) = reusable {
            gpu.write_buffer(vb, vertex_bytes);
            gpu.write_buffer(ib, index_bytes);
            UploadOutcome::Rewritten
        } else {
            self.release(gpu);
            let label = format!("shape {key}");
            self.vertex_buffer = Some(gpu.create_buffer(BufferUsage::Vertex, &label, vertex_bytes));
            self.index_buffer = Some(gpu.create_buffer(BufferUsage::Index, &label, index_bytes));
            UploadOutcome::Allocated
        };

        tracing::debug!(
            %key,
            ?outcome,
            vertex_bytes = vertex_bytes.len(),
            index_bytes = index_bytes.len(),
            "uploaded shape buffers"
        );

        self.bound = Some(key);
        self.vertex_count = mesh.vertex_count() as u32;
        self.index_count = mesh.index_count() as u32;
        self.dirty = false;
        self.uploads += 1;
        outcome
    }

    /// Issue one draw from the bound buffers. Returns `false` if nothing is
    /// resident or the bound mesh is empty.
    pub fn draw<G>(&self, gpu: &mut G, model: DMat4, style: DrawStyle) -> bool
    where
        G: GpuBackend<Buffer = B>,
    {
        let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer)
        else {
            return false;
        };
        if self.index_count == 0 {
            return false;
        }
        gpu.draw(DrawCall {
            vertex_buffer,
            index_buffer,
            index_count: self.index_count,
            model,
            style,
        });
        true
    }

    /// Return both buffers to the backend now. The next sync re-allocates.
    pub fn release<G>(&mut self, gpu: &mut G)
    where
        G: GpuBackend<Buffer = B>,
    {
        if let Some(buffer) = self.vertex_buffer.take() {
            gpu.release(buffer);
        }
        if let Some(buffer) = self.index_buffer.take() {
            gpu.release(buffer);
        }
        if self.bound.take().is_some() {
            self.dirty = true;
        }
        self.index_count = 0;
        self.vertex_count = 0;
    }

    /// Allocated GPU bytes of both buffers.
    pub fn gpu_bytes<G>(&self, gpu: &G) -> u64
    where
        G: GpuBackend<Buffer = B>,
    {
        self.vertex_buffer.as_ref().map_or(0, |b| gpu.buffer_size(b))
            + self.index_buffer.as_ref().map_or(0, |b| gpu.buffer_size(b))
    }
}
