//! Geodetic positions: latitude, longitude, and altitude with an interpretation mode.

use std::fmt;

/// How a position's altitude is interpreted when placing a shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AltitudeMode {
    /// Ignore the altitude and sit on the terrain surface.
    ClampToSurface,
    /// Altitude is measured from the terrain surface.
    RelativeToSurface,
    /// Altitude is measured from the ellipsoid.
    #[default]
    Absolute,
}

/// A position on the globe expressed as latitude, longitude, and altitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPosition {
    /// Latitude in degrees. Range: \[-90, 90\]. Positive = north.
    pub latitude: f64,
    /// Longitude in degrees. Range: \[-180, 180\]. Positive = east.
    pub longitude: f64,
    /// Altitude in meters, interpreted according to an [`AltitudeMode`].
    pub altitude: f64,
}

impl GeoPosition {
    /// Create a new geodetic position.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// A position at zero altitude.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, 0.0)
    }

    /// Returns `true` if all components are finite and the angles are in range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Latitude in radians.
    pub fn latitude_radians(&self) -> f64 {
        self.latitude.to_radians()
    }

    /// Longitude in radians.
    pub fn longitude_radians(&self) -> f64 {
        self.longitude.to_radians()
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_dir = if self.latitude >= 0.0 { "N" } else { "S" };
        let lon_dir = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}\u{00B0}{}, {:.4}\u{00B0}{}, {:.0}m",
            self.latitude.abs(),
            lat_dir,
            self.longitude.abs(),
            lon_dir,
            self.altitude,
        )
    }
}
