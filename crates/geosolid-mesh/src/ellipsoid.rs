//! Unit-sphere tessellation by recursive icosahedron subdivision.
//!
//! Texture coordinates wrap `u` once around the equator (seam on the -X
//! meridian) and run `v` from the north pole (0) to the south pole (1).
//! Triangles crossing the seam get duplicated vertices with `u + 1` so the
//! texture does not smear backwards across the whole sphere.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::cached_mesh::{CachedMesh, MeshBuilder};
use crate::kind::MeshKey;

const ICOSAHEDRON_FACES: [u32; 60] = [
    0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1,
    8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
];

/// Tessellate the unit sphere at `key.subdivisions()` levels of subdivision.
///
/// Level 0 is the bare icosahedron; each level splits every triangle into four.
pub fn build(key: MeshKey) -> CachedMesh {
    let (mut positions, mut indices) = icosahedron();
    for _ in 0..key.subdivisions() {
        subdivide(&mut positions, &mut indices);
    }
    make_outward(&positions, &mut indices);

    let uvs: Vec<Vec2> = positions.iter().map(|p| sphere_uv(*p)).collect();

    let mut builder = MeshBuilder::with_capacity(positions.len() + positions.len() / 8, indices.len());
    for (p, uv) in positions.iter().zip(&uvs) {
        builder.push_vertex(*p, *p, *uv);
    }

    // Seam fix: re-point vertices of wrapping triangles at u + 1 duplicates.
    // Pole vertices have no meaningful longitude; each pole triangle gets its
    // own copy centered between the other two corners.
    let mut seam_copies: FxHashMap<u32, u32> = FxHashMap::default();
    for tri in indices.chunks_exact(3) {
        let mut out = [tri[0], tri[1], tri[2]];
        let pole = out.map(|i| is_pole(positions[i as usize]));
        let mut us = out.map(|i| uvs[i as usize].x);

        let (min_u, max_u) = (0..3)
            .filter(|&k| !pole[k])
            .fold((f32::MAX, f32::MIN), |(lo, hi), k| (lo.min(us[k]), hi.max(us[k])));

        if max_u - min_u > 0.5 {
            for k in 0..3 {
                if pole[k] || us[k] >= 0.5 {
                    continue;
                }
                let original = out[k];
                out[k] = *seam_copies.entry(original).or_insert_with(|| {
                    let p = positions[original as usize];
                    let uv = uvs[original as usize];
                    builder.push_vertex(p, p, Vec2::new(uv.x + 1.0, uv.y))
                });
                us[k] += 1.0;
            }
        }

        for k in 0..3 {
            if pole[k] {
                let u = (0..3).filter(|&j| j != k).map(|j| us[j]).sum::<f32>() / 2.0;
                let p = positions[out[k] as usize];
                let v = uvs[out[k] as usize].y;
                out[k] = builder.push_vertex(p, p, Vec2::new(u, v));
            }
        }

        builder.push_triangle(out[0], out[1], out[2]);
    }

    builder.finish(key)
}

/// Equirectangular texture coordinate for a point on the unit sphere (+Z up).
pub fn sphere_uv(p: Vec3) -> Vec2 {
    let u = 0.5 + p.y.atan2(p.x) / TAU;
    let v = 0.5 - p.z.clamp(-1.0, 1.0).asin() / PI;
    Vec2::new(u, v)
}

fn is_pole(p: Vec3) -> bool {
    p.x.abs() < 1e-6 && p.y.abs() < 1e-6
}

fn icosahedron() -> (Vec<Vec3>, Vec<u32>) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let positions = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .iter()
    .map(|p| p.normalize())
    .collect();
    (positions, ICOSAHEDRON_FACES.to_vec())
}

/// Split each triangle into four at normalized edge midpoints.
///
/// Midpoints are shared between neighboring triangles through an edge cache,
/// so vertex numbering depends only on the input order.
fn subdivide(positions: &mut Vec<Vec3>, indices: &mut Vec<u32>) {
    let mut midpoints: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    let mut next = Vec::with_capacity(indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let edge = if a < b { (a, b) } else { (b, a) };
        *midpoints.entry(edge).or_insert_with(|| {
            let mid = (positions[a as usize] + positions[b as usize]).normalize();
            positions.push(mid);
            (positions.len() - 1) as u32
        })
    };

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);

        next.extend_from_slice(&[a, ab, ca]);
        next.extend_from_slice(&[b, bc, ab]);
        next.extend_from_slice(&[c, ca, bc]);
        next.extend_from_slice(&[ab, bc, ca]);
    }

    *indices = next;
}

/// Wind every triangle counter-clockwise as seen from outside the sphere.
fn make_outward(positions: &[Vec3], indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        let a = positions[tri[0] as usize];
        let b = positions[tri[1] as usize];
        let c = positions[tri[2] as usize];
        if (b - a).cross(c - a).dot(a + b + c) < 0.0 {
            tri.swap(1, 2);
        }
    }
}
