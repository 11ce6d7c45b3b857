//! Square pyramid tessellation.
//!
//! Base corners at (±1, ±1, -1), apex at (0, 0, 1). Faces are flat-shaded, so
//! each face owns its vertices. Subdivision `n` splits every face edge into
//! `2^n` segments.

use glam::{Vec2, Vec3};

use crate::cached_mesh::{CachedMesh, MeshBuilder};
use crate::kind::MeshKey;

/// Base corners, counter-clockwise seen from above.
const BASE: [Vec3; 4] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
];

const APEX: Vec3 = Vec3::new(0.0, 0.0, 1.0);

/// Tessellate the unit pyramid.
pub fn build(key: MeshKey) -> CachedMesh {
    let segments = 1u32 << key.subdivisions();
    let s = segments as usize;
    let side_vertices = (s + 1) * (s + 2) / 2;
    let mut builder = MeshBuilder::with_capacity(
        4 * side_vertices + (s + 1) * (s + 1),
        (4 + 2) * s * s * 3,
    );

    // Sides: u runs around the base, v from the apex (0) down to the base (1).
    for i in 0..4 {
        let a = BASE[i];
        let b = BASE[(i + 1) % 4];
        let u0 = i as f32 / 4.0;
        let u1 = (i + 1) as f32 / 4.0;
        triangle_grid(
            &mut builder,
            [a, b, APEX],
            [Vec2::new(u0, 1.0), Vec2::new(u1, 1.0), Vec2::new((u0 + u1) * 0.5, 0.0)],
            segments,
        );
    }

    // Base, wound to face -Z.
    quad_grid(
        &mut builder,
        [BASE[0], BASE[3], BASE[2], BASE[1]],
        [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ],
        segments,
    );

    builder.finish(key)
}

/// Emit triangle `abc` split into `segments²` triangles with the same winding.
fn triangle_grid(builder: &mut MeshBuilder, corners: [Vec3; 3], uvs: [Vec2; 3], segments: u32) {
    let [a, b, c] = corners;
    let normal = (b - a).cross(c - a).normalize();
    let s = segments as usize;
    let step = 1.0 / segments as f32;

    // Row j holds s - j + 1 vertices.
    let base = builder.vertex_count() as u32;
    for j in 0..=s {
        for i in 0..=(s - j) {
            let (fi, fj) = (i as f32 * step, j as f32 * step);
            let p = a + (b - a) * fi + (c - a) * fj;
            let uv = uvs[0] + (uvs[1] - uvs[0]) * fi + (uvs[2] - uvs[0]) * fj;
            builder.push_vertex(p, normal, uv);
        }
    }

    let row_start = |j: usize| (j * (s + 1) - j * j.saturating_sub(1) / 2) as u32;
    let at = |i: usize, j: usize| base + row_start(j) + i as u32;

    for j in 0..s {
        for i in 0..(s - j) {
            builder.push_triangle(at(i, j), at(i + 1, j), at(i, j + 1));
            if i + j + 1 < s {
                builder.push_triangle(at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            }
        }
    }
}

/// Emit parallelogram `abcd` (counter-clockwise around its front normal) as a
/// `segments × segments` grid.
fn quad_grid(builder: &mut MeshBuilder, corners: [Vec3; 4], uvs: [Vec2; 4], segments: u32) {
    let [a, b, _, d] = corners;
    let normal = (b - a).cross(d - a).normalize();
    let s = segments as usize;
    let step = 1.0 / segments as f32;

    let base = builder.vertex_count() as u32;
    for j in 0..=s {
        for i in 0..=s {
            let (fi, fj) = (i as f32 * step, j as f32 * step);
            let p = a + (b - a) * fi + (d - a) * fj;
            let uv = uvs[0] + (uvs[1] - uvs[0]) * fi + (uvs[3] - uvs[0]) * fj;
            builder.push_vertex(p, normal, uv);
        }
    }

    let at = |i: usize, j: usize| base + (j * (s + 1) + i) as u32;
    for j in 0..s {
        for i in 0..s {
            builder.push_triangle(at(i, j), at(i + 1, j), at(i + 1, j + 1));
            builder.push_triangle(at(i, j), at(i + 1, j + 1), at(i, j + 1));
        }
    }
}
