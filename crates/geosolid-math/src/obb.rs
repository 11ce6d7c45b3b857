//! Oriented bounding boxes in f64 world space.

use glam::{DMat4, DVec3};

/// A box with arbitrary orthonormal axes.
///
/// Invariant: `axes` are unit length and mutually orthogonal; every component
/// of `half_extents` is non-negative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientedBox {
    /// Box center in world space.
    pub center: DVec3,
    /// Unit axes of the box.
    pub axes: [DVec3; 3],
    /// Half-size along each axis.
    pub half_extents: DVec3,
}

impl OrientedBox {
    /// An axis-aligned box from min/max corners.
    pub fn from_min_max(min: DVec3, max: DVec3) -> Self {
        let lo = min.min(max);
        let hi = min.max(max);
        Self {
            center: (lo + hi) * 0.5,
            axes: [DVec3::X, DVec3::Y, DVec3::Z],
            half_extents: (hi - lo) * 0.5,
        }
    }

    /// The tightest box with the given axes enclosing `points`.
    ///
    /// `axes` must be orthonormal. Returns a zero-size box at the origin when
    /// `points` is empty.
    pub fn enclosing(axes: [DVec3; 3], points: &[DVec3]) -> Self {
        if points.is_empty() {
            return Self {
                center: DVec3::ZERO,
                axes,
                half_extents: DVec3::ZERO,
            };
        }

        let mut lo = DVec3::splat(f64::INFINITY);
        let mut hi = DVec3::splat(f64::NEG_INFINITY);
        for p in points {
            let local = DVec3::new(p.dot(axes[0]), p.dot(axes[1]), p.dot(axes[2]));
            lo = lo.min(local);
            hi = hi.max(local);
        }

        let mid = (lo + hi) * 0.5;
        Self {
            center: axes[0] * mid.x + axes[1] * mid.y + axes[2] * mid.z,
            axes,
            half_extents: (hi - lo) * 0.5,
        }
    }

    /// Orthonormal axes following the columns of a transform's 3x3 part.
    ///
    /// Shear and non-uniform scale are removed by Gram-Schmidt; a degenerate
    /// column falls back to the matching world axis.
    pub fn axes_of(matrix: &DMat4) -> [DVec3; 3] {
        let x = matrix.x_axis.truncate().try_normalize().unwrap_or(DVec3::X);
        let y_raw = matrix.y_axis.truncate();
        let y = (y_raw - x * y_raw.dot(x))
            .try_normalize()
            .unwrap_or_else(|| x.any_orthonormal_vector());
        let z = x.cross(y);
        [x, y, z]
    }

    /// A copy of this box moved by `offset`.
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            center: self.center + offset,
            ..*self
        }
    }

    /// Length of the box diagonal.
    pub fn diameter(&self) -> f64 {
        2.0 * self.half_extents.length()
    }

    /// Radius of the bounding sphere around the box.
    pub fn radius(&self) -> f64 {
        self.half_extents.length()
    }

    /// Half the box's thickness when projected onto `direction` (unit length).
    pub fn projected_radius(&self, direction: DVec3) -> f64 {
        self.half_extents.x * self.axes[0].dot(direction).abs()
            + self.half_extents.y * self.axes[1].dot(direction).abs()
            + self.half_extents.z * self.axes[2].dot(direction).abs()
    }

    /// The eight corners of the box.
    pub fn corners(&self) -> [DVec3; 8] {
        let [a, b, c] = [
            self.axes[0] * self.half_extents.x,
            self.axes[1] * self.half_extents.y,
            self.axes[2] * self.half_extents.z,
        ];
        let o = self.center;
        [
            o - a - b - c,
            o + a - b - c,
            o + a + b - c,
            o - a + b - c,
            o - a - b + c,
            o + a - b + c,
            o + a + b + c,
            o - a + b + c,
        ]
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: DVec3) -> bool {
        let d = p - self.center;
        const EPS: f64 = 1e-9;
        d.dot(self.axes[0]).abs() <= self.half_extents.x + EPS
            && d.dot(self.axes[1]).abs() <= self.half_extents.y + EPS
            && d.dot(self.axes[2]).abs() <= self.half_extents.z + EPS
    }

    /// Distance from `p` to the closest point of the box (0 when inside).
    pub fn distance_to(&self, p: DVec3) -> f64 {
        let d = p - self.center;
        let outside = DVec3::new(
            (d.dot(self.axes[0]).abs() - self.half_extents.x).max(0.0),
            (d.dot(self.axes[1]).abs() - self.half_extents.y).max(0.0),
            (d.dot(self.axes[2]).abs() - self.half_extents.z).max(0.0),
        );
        outside.length()
    }
}
