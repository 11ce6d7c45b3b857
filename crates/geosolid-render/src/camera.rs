//! Camera for view and projection matrices in f64 world space.
//!
//! World coordinates are Earth-centered and far beyond f32 precision, so the
//! camera keeps everything in f64 and only produces an eye-relative f32
//! matrix for the GPU.

use geosolid_config::ViewConfig;
use glam::{DMat3, DMat4, DQuat, DVec3, Mat4};

use crate::frustum::Frustum;

/// A camera that generates view and projection matrices.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world space.
    pub position: DVec3,
    /// Rotation as a unit quaternion; the camera looks down its local -Z.
    pub rotation: DQuat,
    /// Projection parameters.
    pub projection: Projection,
    /// Near clip plane distance (always positive).
    pub near: f64,
    /// Far clip plane distance (always positive, > near).
    pub far: f64,
    /// Viewport height in pixels, used to convert world sizes to pixels.
    pub viewport_height: u32,
}

/// Projection type for the camera.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f64,
        /// Width / height.
        aspect_ratio: f64,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half-width of the view volume in world units.
        half_width: f64,
        /// Half-height of the view volume in world units.
        half_height: f64,
    },
}

impl Camera {
    /// A perspective camera configured from the `[view]` section.
    pub fn from_config(view: &ViewConfig) -> Self {
        let height = view.viewport_height.max(1);
        Self {
            position: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: view.fov_y_degrees.to_radians(),
                aspect_ratio: f64::from(view.viewport_width.max(1)) / f64::from(height),
            },
            near: view.near,
            far: view.far,
            viewport_height: height,
        }
    }

    /// Place the camera at `eye` looking at `target`, with `up` as the rough
    /// up direction. Leaves the rotation unchanged if `target == eye`.
    pub fn look_at(&mut self, eye: DVec3, target: DVec3, up: DVec3) {
        self.position = eye;
        let Some(forward) = (target - eye).try_normalize() else {
            return;
        };
        let right = forward
            .cross(up)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let true_up = right.cross(forward);
        self.rotation = DQuat::from_mat3(&DMat3::from_cols(right, true_up, -forward));
    }

    /// Compute the view matrix (inverse of camera transform).
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Compute the projection matrix with reverse-Z (near maps to 1, far to 0).
    pub fn projection_matrix(&self) -> DMat4 {
        match &self.projection {
            Projection::Perspective {
                fov_y,
                aspect_ratio,
            } => DMat4::perspective_rh(*fov_y, *aspect_ratio, self.far, self.near),
            Projection::Orthographic {
                half_width,
                half_height,
            } => DMat4::orthographic_rh(
                -*half_width,
                *half_width,
                -*half_height,
                *half_height,
                self.far,
                self.near,
            ),
        }
    }

    /// Compute the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// View-projection for geometry already expressed relative to the eye,
    /// narrowed to f32 for upload.
    pub fn relative_view_projection(&self) -> Mat4 {
        let view = DMat4::from_quat(self.rotation).inverse();
        (self.projection_matrix() * view).as_mat4()
    }

    /// The view frustum for culling.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }

    /// The forward direction vector (-Z in camera space).
    pub fn forward(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Z
    }

    /// The up direction vector (+Y in camera space).
    pub fn up(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    /// The right direction vector (+X in camera space).
    pub fn right(&self) -> DVec3 {
        self.rotation * DVec3::X
    }

    /// Update the aspect ratio and pixel height from a viewport size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let height = height.max(1);
        self.viewport_height = height;
        if let Projection::Perspective { aspect_ratio, .. } = &mut self.projection {
            *aspect_ratio = f64::from(width.max(1)) / f64::from(height);
        }
    }

    /// World-space size of one pixel at `distance` from the eye.
    pub fn pixel_size_at_distance(&self, distance: f64) -> f64 {
        let pixels = f64::from(self.viewport_height.max(1));
        match &self.projection {
            Projection::Perspective { fov_y, .. } => {
                2.0 * distance.abs() * (fov_y * 0.5).tan() / pixels
            }
            Projection::Orthographic { half_height, .. } => 2.0 * half_height / pixels,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_camera_looks_down_neg_z() {
        let camera = Camera::default();
        assert!(camera.forward().abs_diff_eq(DVec3::NEG_Z, 1e-12));
    }

    #[test]
    fn test_from_config() {
        let camera = Camera::from_config(&ViewConfig::default());
        assert_eq!(camera.viewport_height, 720);
        if let Projection::Perspective {
            fov_y,
            aspect_ratio,
        } = camera.projection
        {
            assert!((fov_y - 45.0_f64.to_radians()).abs() < 1e-12);
            assert!((aspect_ratio - 1280.0 / 720.0).abs() < 1e-12);
        } else {
            panic!("expected perspective projection");
        }
    }

    #[test]
    fn test_look_at_points_forward_at_target() {
        let mut camera = Camera::default();
        let eye = DVec3::new(7.0e6, 0.0, 0.0);
        camera.look_at(eye, DVec3::ZERO, DVec3::Z);
        assert!(camera.forward().abs_diff_eq(DVec3::NEG_X, 1e-12));
        assert!(camera.up().abs_diff_eq(DVec3::Z, 1e-12));
        assert_eq!(camera.position, eye);
    }

    #[test]
    fn test_look_at_degenerate_up() {
        let mut camera = Camera::default();
        camera.look_at(DVec3::ZERO, DVec3::new(0.0, 0.0, 10.0), DVec3::Z);
        assert!(camera.forward().abs_diff_eq(DVec3::Z, 1e-12));
        assert!(camera.up().is_normalized());
    }

    #[test]
    fn test_view_matrix_inverse_is_camera_transform() {
        let camera = Camera {
            position: DVec3::new(10.0, 20.0, 30.0),
            rotation: DQuat::from_rotation_y(FRAC_PI_2),
            ..Camera::default()
        };
        let inv_view = camera.view_matrix().inverse();
        let reconstructed = inv_view.col(3).truncate();
        assert!(reconstructed.abs_diff_eq(camera.position, 1e-9));
    }

    #[test]
    fn test_reverse_z_depth_range() {
        let camera = Camera {
            near: 1.0,
            far: 1000.0,
            ..Camera::default()
        };
        let vp = camera.view_projection_matrix();
        let near = vp.project_point3(DVec3::new(0.0, 0.0, -1.0));
        let far = vp.project_point3(DVec3::new(0.0, 0.0, -1000.0));
        assert!((near.z - 1.0).abs() < 1e-9);
        assert!(far.z.abs() < 1e-9);
    }

    #[test]
    fn test_pixel_size_grows_with_distance() {
        let camera = Camera::default();
        let near = camera.pixel_size_at_distance(10.0);
        let far = camera.pixel_size_at_distance(1000.0);
        assert!((far / near - 100.0).abs() < 1e-9);
        // 45° fov over 720 px: 2 * tan(22.5°) / 720 world units per pixel at 1 m
        let expected = 2.0 * (22.5_f64).to_radians().tan() / 720.0;
        assert!((camera.pixel_size_at_distance(1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_orthographic_pixel_size_is_constant() {
        let camera = Camera {
            projection: Projection::Orthographic {
                half_width: 640.0,
                half_height: 360.0,
            },
            ..Camera::default()
        };
        assert_eq!(camera.pixel_size_at_distance(1.0), 1.0);
        assert_eq!(camera.pixel_size_at_distance(5000.0), 1.0);
    }

    #[test]
    fn test_relative_view_projection_ignores_position() {
        let mut a = Camera::default();
        let mut b = Camera::default();
        a.look_at(DVec3::new(6.4e6, 0.0, 0.0), DVec3::ZERO, DVec3::Z);
        b.look_at(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO, DVec3::Z);
        assert!(
            a.relative_view_projection()
                .abs_diff_eq(b.relative_view_projection(), 1e-6)
        );
    }

    #[test]
    fn test_up_right_forward_orthogonal() {
        let mut camera = Camera::default();
        camera.look_at(DVec3::new(3.0, -4.0, 2.0), DVec3::ZERO, DVec3::Z);
        let (f, u, r) = (camera.forward(), camera.up(), camera.right());
        assert!(f.dot(u).abs() < 1e-12);
        assert!(f.dot(r).abs() < 1e-12);
        assert!(u.dot(r).abs() < 1e-12);
    }
}
