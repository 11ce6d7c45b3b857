//! Dispatch from a [`MeshKey`] to the tessellator for its shape kind.

use crate::cached_mesh::CachedMesh;
use crate::kind::{MeshKey, ShapeKind};
use crate::{ellipsoid, pyramid};

/// Build the canonical unit mesh for `key`.
///
/// Pure and deterministic: equal keys always produce identical vertex and
/// index data, which is what makes sharing meshes through the cache sound.
pub fn tessellate(key: MeshKey) -> CachedMesh {
    let mesh = match key.kind() {
        ShapeKind::Ellipsoid => ellipsoid::build(key),
        ShapeKind::Pyramid => pyramid::build(key),
    };
    tracing::trace!(
        %key,
        vertices = mesh.vertex_count(),
        triangles = mesh.primitive_count(),
        "tessellated"
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Facing, MAX_SUBDIVISIONS};

    #[test]
    fn test_deterministic_for_all_keys() {
        for kind in ShapeKind::ALL {
            for level in 0..=3 {
                let key = MeshKey::new(kind, level);
                let a = tessellate(key);
                let b = tessellate(key);
                assert_eq!(a.positions(), b.positions(), "{key}");
                assert_eq!(a.indices(), b.indices(), "{key}");
            }
        }
    }

    #[test]
    fn test_vertex_count_monotonic_in_subdivisions() {
        for kind in ShapeKind::ALL {
            let counts: Vec<usize> = (0..=MAX_SUBDIVISIONS)
                .map(|level| tessellate(MeshKey::new(kind, level)).vertex_count())
                .collect();
            for pair in counts.windows(2) {
                assert!(pair[1] >= pair[0], "{kind}: {counts:?}");
            }
        }
    }

    #[test]
    fn test_mesh_tagged_with_key() {
        let key = MeshKey::with_facing(ShapeKind::Pyramid, 2, Facing::Inside);
        let mesh = tessellate(key);
        assert_eq!(mesh.key(), key);
        assert_eq!(mesh.kind(), ShapeKind::Pyramid);
        assert_eq!(mesh.subdivisions(), 2);
    }

    #[test]
    fn test_meshes_are_unit_scaled_and_centered() {
        for kind in ShapeKind::ALL {
            let mesh = tessellate(MeshKey::new(kind, 2));
            let max = mesh
                .positions()
                .iter()
                .fold(0.0_f32, |m, p| m.max(p.abs().max_element()));
            assert!((max - 1.0).abs() < 1e-5, "{kind} max extent {max}");
        }
    }

    #[test]
    fn test_every_mesh_has_geometry() {
        for kind in ShapeKind::ALL {
            for level in 0..=MAX_SUBDIVISIONS {
                assert!(tessellate(MeshKey::new(kind, level)).has_geometry());
            }
        }
    }
}
