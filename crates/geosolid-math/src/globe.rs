//! Ellipsoidal globe model: geodetic to Cartesian conversion and local surface frames.
//!
//! World space is Earth-centered, Earth-fixed: +X through (0°, 0°), +Y through
//! (0°, 90°E), +Z through the north pole. All world-space math is `f64`.

use glam::{DMat4, DVec3};

use crate::{AltitudeMode, GeoPosition};

/// WGS84 semi-major axis in meters.
pub const WGS84_EQUATORIAL_RADIUS: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in meters.
pub const WGS84_POLAR_RADIUS: f64 = 6_356_752.314_245;

/// Terrain elevation source.
///
/// Returning `None` means the elevation data for that location is not resident
/// yet; callers treat it as "try again next frame".
pub trait ElevationModel {
    /// Terrain elevation above the ellipsoid in meters.
    fn elevation(&self, latitude: f64, longitude: f64) -> Option<f64>;
}

/// Terrain with the same elevation everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlatTerrain {
    /// Elevation above the ellipsoid in meters.
    pub elevation: f64,
}

impl FlatTerrain {
    /// Create flat terrain at the given elevation.
    pub fn new(elevation: f64) -> Self {
        Self { elevation }
    }
}

impl ElevationModel for FlatTerrain {
    fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
        Some(self.elevation)
    }
}

/// An oblate ellipsoid of revolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Globe {
    equatorial_radius: f64,
    polar_radius: f64,
    /// First eccentricity squared.
    es: f64,
}

impl Globe {
    /// Create an ellipsoid with the given radii in meters.
    ///
    /// # Panics
    ///
    /// Panics if either radius is non-positive or the polar radius exceeds the
    /// equatorial radius.
    pub fn new(equatorial_radius: f64, polar_radius: f64) -> Self {
        assert!(
            equatorial_radius > 0.0 && polar_radius > 0.0,
            "globe radii must be positive"
        );
        assert!(
            polar_radius <= equatorial_radius,
            "polar radius must not exceed equatorial radius"
        );
        let es = 1.0 - (polar_radius * polar_radius) / (equatorial_radius * equatorial_radius);
        Self {
            equatorial_radius,
            polar_radius,
            es,
        }
    }

    /// The WGS84 earth ellipsoid.
    pub fn wgs84() -> Self {
        Self::new(WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS)
    }

    /// A perfect sphere, convenient for tests.
    pub fn sphere(radius: f64) -> Self {
        Self::new(radius, radius)
    }

    /// Semi-major axis in meters.
    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    /// Semi-minor axis in meters.
    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }

    /// Convert a geodetic coordinate (degrees, meters above the ellipsoid) to world space.
    pub fn point_at(&self, latitude: f64, longitude: f64, height: f64) -> DVec3 {
        let lat = latitude.to_radians();
        let lon = longitude.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        // Prime vertical radius of curvature.
        let n = self.equatorial_radius / (1.0 - self.es * sin_lat * sin_lat).sqrt();

        DVec3::new(
            (n + height) * cos_lat * cos_lon,
            (n + height) * cos_lat * sin_lon,
            (n * (1.0 - self.es) + height) * sin_lat,
        )
    }

    /// The outward geodetic surface normal at the given latitude/longitude.
    pub fn surface_normal(&self, latitude: f64, longitude: f64) -> DVec3 {
        let (sin_lat, cos_lat) = latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = longitude.to_radians().sin_cos();
        DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// The local east/north/up frame at a point.
    ///
    /// Columns: east (+X), north (+Y), up (+Z), and `origin` as translation.
    /// East depends on longitude only, so the frame stays defined at the poles.
    pub fn local_frame(&self, latitude: f64, longitude: f64, origin: DVec3) -> DMat4 {
        let up = self.surface_normal(latitude, longitude);
        let (sin_lon, cos_lon) = longitude.to_radians().sin_cos();
        let east = DVec3::new(-sin_lon, cos_lon, 0.0);
        let north = up.cross(east).normalize();
        DMat4::from_cols(
            east.extend(0.0),
            north.extend(0.0),
            up.extend(0.0),
            origin.extend(1.0),
        )
    }

    /// The world-space anchor point of a position under the given altitude mode.
    ///
    /// Altitudes and terrain elevations are multiplied by `vertical_exaggeration`.
    /// Returns `None` when the terrain under a surface-relative position is not
    /// resident.
    pub fn reference_point(
        &self,
        position: &GeoPosition,
        mode: AltitudeMode,
        terrain: &dyn ElevationModel,
        vertical_exaggeration: f64,
    ) -> Option<DVec3> {
        let height = match mode {
            AltitudeMode::Absolute => position.altitude * vertical_exaggeration,
            AltitudeMode::ClampToSurface => {
                terrain.elevation(position.latitude, position.longitude)? * vertical_exaggeration
            }
            AltitudeMode::RelativeToSurface => {
                let ground = terrain.elevation(position.latitude, position.longitude)?;
                (ground + position.altitude) * vertical_exaggeration
            }
        };
        Some(self.point_at(position.latitude, position.longitude, height))
    }
}

impl Default for Globe {
    fn default() -> Self {
        Self::wgs84()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MissingTerrain;

    impl ElevationModel for MissingTerrain {
        fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
            None
        }
    }

    #[test]
    fn test_equator_prime_meridian_on_x_axis() {
        let globe = Globe::wgs84();
        let p = globe.point_at(0.0, 0.0, 0.0);
        assert!(p.abs_diff_eq(DVec3::new(WGS84_EQUATORIAL_RADIUS, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn test_north_pole_on_z_axis() {
        let globe = Globe::wgs84();
        let p = globe.point_at(90.0, 0.0, 0.0);
        assert!((p.z - WGS84_POLAR_RADIUS).abs() < 1e-3);
        assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
    }

    #[test]
    fn test_height_moves_along_normal() {
        let globe = Globe::wgs84();
        let base = globe.point_at(37.0, -122.0, 0.0);
        let raised = globe.point_at(37.0, -122.0, 1000.0);
        let normal = globe.surface_normal(37.0, -122.0);
        assert!((raised - base).abs_diff_eq(normal * 1000.0, 1e-6));
    }

    #[test]
    fn test_sphere_points_lie_at_radius() {
        let globe = Globe::sphere(1000.0);
        for &(lat, lon) in &[(0.0, 0.0), (45.0, 45.0), (-60.0, 170.0), (89.0, -10.0)] {
            let p = globe.point_at(lat, lon, 0.0);
            assert!((p.length() - 1000.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_local_frame_is_orthonormal() {
        let globe = Globe::wgs84();
        let frame = globe.local_frame(51.5, -0.12, DVec3::ZERO);
        let east = frame.x_axis.truncate();
        let north = frame.y_axis.truncate();
        let up = frame.z_axis.truncate();
        assert!((east.length() - 1.0).abs() < 1e-12);
        assert!((north.length() - 1.0).abs() < 1e-12);
        assert!(east.dot(north).abs() < 1e-12);
        assert!(east.dot(up).abs() < 1e-12);
        assert!(east.cross(north).abs_diff_eq(up, 1e-12));
    }

    #[test]
    fn test_local_frame_north_points_towards_pole() {
        let globe = Globe::sphere(1.0);
        let frame = globe.local_frame(0.0, 0.0, DVec3::X);
        assert!(frame.y_axis.truncate().abs_diff_eq(DVec3::Z, 1e-12));
        assert!(frame.x_axis.truncate().abs_diff_eq(DVec3::Y, 1e-12));
        assert!(frame.w_axis.truncate().abs_diff_eq(DVec3::X, 1e-12));
    }

    #[test]
    fn test_reference_point_modes() {
        let globe = Globe::sphere(1000.0);
        let terrain = FlatTerrain::new(10.0);
        let pos = GeoPosition::new(0.0, 0.0, 5.0);

        let absolute = globe
            .reference_point(&pos, AltitudeMode::Absolute, &terrain, 1.0)
            .unwrap();
        let clamped = globe
            .reference_point(&pos, AltitudeMode::ClampToSurface, &terrain, 1.0)
            .unwrap();
        let relative = globe
            .reference_point(&pos, AltitudeMode::RelativeToSurface, &terrain, 1.0)
            .unwrap();

        assert!((absolute.x - 1005.0).abs() < 1e-9);
        assert!((clamped.x - 1010.0).abs() < 1e-9);
        assert!((relative.x - 1015.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_point_applies_exaggeration() {
        let globe = Globe::sphere(1000.0);
        let pos = GeoPosition::new(0.0, 0.0, 5.0);
        let p = globe
            .reference_point(&pos, AltitudeMode::Absolute, &FlatTerrain::default(), 2.0)
            .unwrap();
        assert!((p.x - 1010.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_point_missing_terrain() {
        let globe = Globe::sphere(1000.0);
        let pos = GeoPosition::new(10.0, 10.0, 0.0);
        assert!(
            globe
                .reference_point(&pos, AltitudeMode::ClampToSurface, &MissingTerrain, 1.0)
                .is_none()
        );
        // Absolute positions never consult the terrain.
        assert!(
            globe
                .reference_point(&pos, AltitudeMode::Absolute, &MissingTerrain, 1.0)
                .is_some()
        );
    }

    #[test]
    #[should_panic(expected = "positive")]
    fn test_non_positive_radius_panics() {
        Globe::new(0.0, 0.0);
    }
}
