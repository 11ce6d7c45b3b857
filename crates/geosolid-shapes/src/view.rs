//! What a shape needs to know about the current view and the terrain.

use geosolid_math::{AltitudeMode, ElevationModel, FlatTerrain, GeoPosition, Globe, OrientedBox};
use geosolid_render::{Camera, Frustum};
use glam::{DMat4, DVec3};

/// Per-frame view and terrain queries used by a render session.
pub trait ViewContext {
    /// Eye position in world space.
    fn eye_point(&self) -> DVec3;

    /// World-space size of one pixel at `distance` from the eye.
    fn pixel_size_at_distance(&self, distance: f64) -> f64;

    /// World-space anchor of `position` under `mode`, or `None` when the
    /// terrain it depends on is not available yet.
    fn reference_point(&self, position: &GeoPosition, mode: AltitudeMode) -> Option<DVec3>;

    /// East/north/up frame at `position`, translated to `origin`.
    fn surface_frame(&self, position: &GeoPosition, origin: DVec3) -> DMat4;

    /// Returns `true` if any part of `extent` may be visible.
    fn intersects_frustum(&self, extent: &OrientedBox) -> bool;

    /// Multiplier applied to altitudes and elevations.
    fn vertical_exaggeration(&self) -> f64 {
        1.0
    }
}

/// A camera looking at an ellipsoidal globe with an elevation model.
pub struct GlobeView<T = FlatTerrain> {
    globe: Globe,
    camera: Camera,
    frustum: Frustum,
    terrain: T,
    vertical_exaggeration: f64,
}

impl<T: ElevationModel> GlobeView<T> {
    pub fn new(globe: Globe, camera: Camera, terrain: T) -> Self {
        let frustum = camera.frustum();
        Self {
            globe,
            camera,
            frustum,
            terrain,
            vertical_exaggeration: 1.0,
        }
    }

    pub fn globe(&self) -> &Globe {
        &self.globe
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the camera and rebuild the culling frustum.
    pub fn set_camera(&mut self, camera: Camera) {
        self.frustum = camera.frustum();
        self.camera = camera;
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    /// Non-finite or non-positive values are ignored.
    pub fn set_vertical_exaggeration(&mut self, exaggeration: f64) {
        if exaggeration.is_finite() && exaggeration > 0.0 {
            self.vertical_exaggeration = exaggeration;
        } else {
            tracing::warn!(exaggeration, "ignoring invalid vertical exaggeration");
        }
    }
}

impl<T: ElevationModel> ViewContext for GlobeView<T> {
    fn eye_point(&self) -> DVec3 {
        self.camera.position
    }

    fn pixel_size_at_distance(&self, distance: f64) -> f64 {
        self.camera.pixel_size_at_distance(distance)
    }

    fn reference_point(&self, position: &GeoPosition, mode: AltitudeMode) -> Option<DVec3> {
        self.globe
            .reference_point(position, mode, &self.terrain, self.vertical_exaggeration)
    }

    fn surface_frame(&self, position: &GeoPosition, origin: DVec3) -> DMat4 {
        self.globe
            .local_frame(position.latitude, position.longitude, origin)
    }

    fn intersects_frustum(&self, extent: &OrientedBox) -> bool {
        self.frustum.intersects_box(extent)
    }

    fn vertical_exaggeration(&self) -> f64 {
        self.vertical_exaggeration
    }
}
