//! Canonical shape meshes: tessellation of unit solids, the shared geometry cache,
//! and the GPU vertex format the meshes are uploaded in.

pub mod cache;
pub mod cached_mesh;
pub mod ellipsoid;
pub mod kind;
pub mod pyramid;
pub mod tessellator;
pub mod vertex_format;

pub use cache::{CacheStats, DEFAULT_CAPACITY_BYTES, DEFAULT_LOW_WATER_RATIO, GeometryCache};
pub use cached_mesh::{CachedMesh, MeshBuilder};
pub use kind::{Facing, MAX_SUBDIVISIONS, MeshKey, ShapeKind};
pub use tessellator::tessellate;
pub use vertex_format::{SHAPE_VERTEX_ATTRIBUTES, SHAPE_VERTEX_LAYOUT, ShapeVertex};
