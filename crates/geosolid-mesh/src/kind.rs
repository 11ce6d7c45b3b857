//! Shape kinds, normal facing, and the cache key for canonical meshes.

use std::fmt;

use glam::DVec3;

/// Highest subdivision count any tessellator accepts.
pub const MAX_SUBDIVISIONS: u32 = 6;

/// The closed set of canonical solids.
///
/// Every kind is tessellated in the same object space: centered at the origin,
/// spanning \[-1, 1\] on each axis, with +X east-west, +Y north-south and +Z
/// vertical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Unit sphere, scaled per axis into an ellipsoid.
    Ellipsoid,
    /// Square base at z = -1 with the apex at z = +1.
    Pyramid,
}

/// Points whose transformed bounds enclose the whole ellipsoid: four cube
/// corners spanning a tetrahedron.
const ELLIPSOID_EXTREMA: [DVec3; 4] = [
    DVec3::new(-1.0, 1.0, -1.0),
    DVec3::new(1.0, 1.0, 1.0),
    DVec3::new(1.0, -1.0, -1.0),
    DVec3::new(-1.0, -1.0, 1.0),
];

/// The pyramid's own vertices: base corners and apex.
const PYRAMID_EXTREMA: [DVec3; 5] = [
    DVec3::new(-1.0, -1.0, -1.0),
    DVec3::new(1.0, -1.0, -1.0),
    DVec3::new(1.0, 1.0, -1.0),
    DVec3::new(-1.0, 1.0, -1.0),
    DVec3::new(0.0, 0.0, 1.0),
];

impl ShapeKind {
    /// All kinds, in declaration order.
    pub const ALL: [ShapeKind; 2] = [ShapeKind::Ellipsoid, ShapeKind::Pyramid];

    /// Canonical points used to bound the shape after transformation.
    ///
    /// Bounding these points along the shape's local axes yields a box that
    /// contains the whole tessellated mesh at any subdivision.
    pub fn extent_extrema(self) -> &'static [DVec3] {
        match self {
            ShapeKind::Ellipsoid => &ELLIPSOID_EXTREMA,
            ShapeKind::Pyramid => &PYRAMID_EXTREMA,
        }
    }

    /// Short lowercase name, used in buffer labels and logs.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Ellipsoid => "ellipsoid",
            ShapeKind::Pyramid => "pyramid",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of the surface normals and front faces point to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facing {
    /// Normals point away from the center, faces wind counter-clockwise seen from outside.
    #[default]
    Outside,
    /// Normals point into the solid, for viewing from inside it.
    Inside,
}

/// Identity of a canonical mesh in the geometry cache.
///
/// Compared by value. The subdivision count is always within
/// `0..=MAX_SUBDIVISIONS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshKey {
    kind: ShapeKind,
    subdivisions: u32,
    facing: Facing,
}

impl MeshKey {
    /// Key for an outward-facing mesh.
    ///
    /// Subdivision counts above [`MAX_SUBDIVISIONS`] are clamped.
    pub fn new(kind: ShapeKind, subdivisions: u32) -> Self {
        Self::with_facing(kind, subdivisions, Facing::Outside)
    }

    /// Key with an explicit facing. Clamps like [`MeshKey::new`].
    pub fn with_facing(kind: ShapeKind, subdivisions: u32, facing: Facing) -> Self {
        if subdivisions > MAX_SUBDIVISIONS {
            tracing::warn!(
                %kind,
                requested = subdivisions,
                max = MAX_SUBDIVISIONS,
                "subdivision count out of range, clamping"
            );
        }
        Self {
            kind,
            subdivisions: subdivisions.min(MAX_SUBDIVISIONS),
            facing,
        }
    }

    /// Shape kind.
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Subdivision count, never above [`MAX_SUBDIVISIONS`].
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Normal facing.
    pub fn facing(&self) -> Facing {
        self.facing
    }
}

impl fmt::Display for MeshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subdivisions)?;
        if self.facing == Facing::Inside {
            f.write_str("/inside")?;
        }
        Ok(())
    }
}
