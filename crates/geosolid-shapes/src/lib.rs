//! Procedural volumetric shapes on a globe.
//!
//! A [`ShapeDescriptor`] places a canonical solid (ellipsoid or pyramid) at a
//! geodetic position with per-axis radii, optional heading/tilt/roll and
//! per-axis scale. A [`RenderSession`] turns it into draw calls each frame:
//! it resolves the reference point, selects a level of detail from the
//! previous frame's extent, fetches the mesh from the shared
//! [`GeometryCache`](geosolid_mesh::GeometryCache), composes the render
//! matrix, culls against the view and keeps the instance's GPU buffers
//! current.

mod descriptor;
mod error;
mod session;
mod transform;
mod view;

#[cfg(test)]
mod session_tests;

pub use descriptor::{Rotation, ShapeAttributes, ShapeDescriptor};
pub use error::{Axis, ShapeError};
pub use session::{FrameOutcome, RenderSession};
pub use transform::{compute_extent, compute_render_matrix};
pub use view::{GlobeView, ViewContext};
