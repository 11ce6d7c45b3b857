//! Error types for shape configuration.

use std::fmt;

/// One of a shape's three local axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    NorthSouth,
    Vertical,
    EastWest,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::NorthSouth => "north-south",
            Axis::Vertical => "vertical",
            Axis::EastWest => "east-west",
        })
    }
}

/// Rejected shape configuration. The descriptor is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// A radius is zero, negative, or not finite.
    #[error("{axis} radius must be positive and finite, got {value}")]
    InvalidRadius { axis: Axis, value: f64 },

    /// A scale factor is zero, negative, or not finite.
    #[error("{axis} scale must be positive and finite, got {value}")]
    InvalidScale { axis: Axis, value: f64 },

    /// Latitude/longitude out of range or any component not finite.
    #[error("invalid position: latitude {latitude}, longitude {longitude}, altitude {altitude}")]
    InvalidPosition {
        latitude: f64,
        longitude: f64,
        altitude: f64,
    },

    /// A rotation angle is not finite.
    #[error("{angle} must be finite, got {value}")]
    InvalidAngle { angle: &'static str, value: f64 },

    /// The detail hint is not finite.
    #[error("detail hint must be finite, got {0}")]
    InvalidDetailHint(f64),
}
