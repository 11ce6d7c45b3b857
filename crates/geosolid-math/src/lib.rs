//! Geodetic positions, the ellipsoidal globe model, and oriented bounding boxes.

mod geodetic;
mod globe;
mod obb;

pub use geodetic::{AltitudeMode, GeoPosition};
pub use globe::{ElevationModel, FlatTerrain, Globe, WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS};
pub use obb::OrientedBox;
