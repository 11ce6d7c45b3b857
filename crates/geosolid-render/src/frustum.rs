//! View-frustum culling in f64 world space.
//!
//! Planes are extracted from a reverse-Z view-projection matrix and tested
//! against oriented bounding boxes, so a shape's extent can be culled
//! directly in Earth-centered coordinates.

use geosolid_math::OrientedBox;
use glam::{DMat4, DVec3, DVec4};

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `DVec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [DVec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix
    /// using the Griggs-Hartmann method, for a 0..1 depth range with
    /// reverse-Z (near at depth 1, far at depth 0).
    pub fn from_view_projection(vp: &DMat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [DVec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        // depth <= 1 bounds the near side, depth >= 0 the far side.
        planes[NEAR] = rows[3] - rows[2];
        planes[FAR] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// The six planes, left, right, bottom, top, near, far.
    pub fn planes(&self) -> &[DVec4; 6] {
        &self.planes
    }

    /// Returns `true` if the point is inside all six planes.
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(p) + plane.w >= 0.0)
    }

    /// Returns `true` if a sphere is at least partially inside.
    pub fn intersects_sphere(&self, center: DVec3, radius: f64) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    /// Returns `true` if an oriented box is at least partially inside.
    ///
    /// For each plane the box's extent along the plane normal is compared
    /// against the signed distance of its center. Conservative: boxes near
    /// frustum corners may pass without being visible, but visible boxes
    /// never fail.
    pub fn intersects_box(&self, obb: &OrientedBox) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            normal.dot(obb.center) + plane.w >= -obb.projected_radius(normal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> DMat4 {
        let view = DMat4::look_to_rh(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y);
        let proj = DMat4::perspective_rh(
            std::f64::consts::FRAC_PI_4,
            16.0 / 9.0,
            1000.0, // reverse-Z: far as near param
            0.1,    // reverse-Z: near as far param
        );
        proj * view
    }

    fn cube(center: DVec3, half: f64) -> OrientedBox {
        OrientedBox::from_min_max(center - DVec3::splat(half), center + DVec3::splat(half))
    }

    #[test]
    fn test_object_in_front_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        assert!(frustum.intersects_box(&cube(DVec3::new(0.0, 0.0, -4.0), 1.0)));
        assert!(frustum.contains_point(DVec3::new(0.0, 0.0, -4.0)));
    }

    #[test]
    fn test_object_behind_camera_not_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        assert!(!frustum.intersects_box(&cube(DVec3::new(0.0, 0.0, 7.0), 2.0)));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let outside = [
            DVec3::new(-1000.0, 0.0, -5.0),
            DVec3::new(1000.0, 0.0, -5.0),
            DVec3::new(0.0, -1000.0, -5.0),
            DVec3::new(0.0, 1000.0, -5.0),
            DVec3::new(0.0, 0.0, -0.01),
            DVec3::new(0.0, 0.0, -2000.0),
        ];
        for center in outside {
            assert!(!frustum.intersects_box(&cube(center, 0.001)), "{center}");
            assert!(!frustum.contains_point(center), "{center}");
        }
    }

    #[test]
    fn test_partially_inside_box_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let wide = OrientedBox::from_min_max(
            DVec3::new(-100.0, -1.0, -10.0),
            DVec3::new(1.0, 1.0, -5.0),
        );
        assert!(frustum.intersects_box(&wide));
    }

    #[test]
    fn test_rotated_box_reaching_into_view() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        // A long thin box to the left, rotated so one end reaches the view axis.
        let axes = OrientedBox::axes_of(&DMat4::from_rotation_y(std::f64::consts::FRAC_PI_4));
        let obb = OrientedBox {
            center: DVec3::new(-20.0, 0.0, -30.0),
            axes,
            half_extents: DVec3::new(30.0, 0.5, 0.5),
        };
        assert!(frustum.intersects_box(&obb));
        let short = OrientedBox {
            half_extents: DVec3::new(1.0, 0.5, 0.5),
            ..obb
        };
        assert!(!frustum.intersects_box(&short));
    }

    #[test]
    fn test_sphere_test() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        assert!(frustum.intersects_sphere(DVec3::new(0.0, 0.0, 5.0), 6.0));
        assert!(!frustum.intersects_sphere(DVec3::new(0.0, 0.0, 5.0), 1.0));
    }

    #[test]
    fn test_planes_are_normalized() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        for plane in frustum.planes() {
            let len = plane.truncate().length();
            assert!((len - 1.0).abs() < 1e-9, "plane normal not normalized: {len}");
        }
    }
}
