//! Placing a canonical mesh in world space and bounding it.

use geosolid_math::OrientedBox;
use geosolid_mesh::ShapeKind;
use glam::{DMat4, DVec3};

use crate::descriptor::ShapeDescriptor;

/// Object-to-world matrix of a shape.
///
/// `surface_frame` is the east/north/up frame at the shape's reference point,
/// with the reference point as its translation. Onto it are composed, in
/// order: heading about the local vertical (`360 - heading`, so positive
/// headings turn clockwise seen from above), tilt about east-west, roll
/// about north-south, and the per-axis scaled radii.
pub fn compute_render_matrix(descriptor: &ShapeDescriptor, surface_frame: DMat4) -> DMat4 {
    let rotation = descriptor.rotation();
    let mut matrix = surface_frame;
    if let Some(heading) = rotation.heading {
        matrix *= DMat4::from_rotation_z((360.0 - heading).to_radians());
    }
    if let Some(tilt) = rotation.tilt {
        matrix *= DMat4::from_rotation_x(tilt.to_radians());
    }
    if let Some(roll) = rotation.roll {
        matrix *= DMat4::from_rotation_y(roll.to_radians());
    }
    matrix * DMat4::from_scale(descriptor.scaled_radii())
}

/// World-space bounding box of a shape rendered with `matrix`.
///
/// The kind's extremal points are transformed without translation, bounded
/// along the matrix's axes, and the box is then moved to `reference_point`.
pub fn compute_extent(matrix: &DMat4, reference_point: DVec3, kind: ShapeKind) -> OrientedBox {
    let points: Vec<DVec3> = kind
        .extent_extrema()
        .iter()
        .map(|p| matrix.transform_vector3(*p))
        .collect();
    OrientedBox::enclosing(OrientedBox::axes_of(matrix), &points).translated(reference_point)
}
