//! User-facing configuration of one shape instance.
//!
//! Setters validate their input and leave the descriptor untouched when they
//! return an error. A descriptor is plain data: render sessions compare its
//! geometry by value, so editing one in place and swapping in a fresh one are
//! the same thing to them.

use geosolid_config::RenderConfig;
use geosolid_math::{AltitudeMode, GeoPosition};
use geosolid_mesh::{Facing, ShapeKind};
use geosolid_render::{Color, TextureRef};
use glam::DVec3;

use crate::error::{Axis, ShapeError};

/// Optional heading, tilt and roll in degrees.
///
/// Absent angles are skipped when composing the render matrix, which is the
/// same as an angle of zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotation {
    /// Clockwise from north, about the local vertical axis.
    pub heading: Option<f64>,
    /// About the local east-west axis.
    pub tilt: Option<f64>,
    /// About the local north-south axis.
    pub roll: Option<f64>,
}

impl Rotation {
    pub fn new(heading: f64, tilt: f64, roll: f64) -> Self {
        Self {
            heading: Some(heading),
            tilt: Some(tilt),
            roll: Some(roll),
        }
    }

    /// Only a heading.
    pub fn heading(heading: f64) -> Self {
        Self {
            heading: Some(heading),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ShapeError> {
        for (angle, value) in [
            ("heading", self.heading),
            ("tilt", self.tilt),
            ("roll", self.roll),
        ] {
            if let Some(value) = value
                && !value.is_finite()
            {
                return Err(ShapeError::InvalidAngle { angle, value });
            }
        }
        Ok(())
    }
}

/// How a shape is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeAttributes {
    pub draw_interior: bool,
    pub draw_outline: bool,
    /// Interior fill color. With neither a color nor a resolved texture the
    /// interior is not drawn.
    pub interior_color: Option<Color>,
    pub outline_color: Color,
    /// Outline width in pixels.
    pub outline_width: f32,
}

impl Default for ShapeAttributes {
    fn default() -> Self {
        Self {
            draw_interior: true,
            draw_outline: false,
            interior_color: Some(Color::rgba(0.9, 0.9, 0.9, 1.0)),
            outline_color: Color::BLACK,
            outline_width: 1.0,
        }
    }
}

impl ShapeAttributes {
    /// Defaults with the draw toggles taken from the `[render]` section.
    pub fn from_config(render: &RenderConfig) -> Self {
        Self {
            draw_interior: render.draw_interior,
            draw_outline: render.draw_outline,
            ..Self::default()
        }
    }
}

/// A procedural solid placed on the globe.
///
/// Radii are half-lengths along the shape's local north-south, vertical and
/// east-west axes. Scale factors multiply the radii per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDescriptor {
    kind: ShapeKind,
    position: GeoPosition,
    altitude_mode: AltitudeMode,
    north_south_radius: f64,
    vertical_radius: f64,
    east_west_radius: f64,
    rotation: Rotation,
    north_south_scale: f64,
    vertical_scale: f64,
    east_west_scale: f64,
    detail_hint: f64,
    texture: Option<TextureRef>,
    facing: Facing,
    attributes: ShapeAttributes,
}

impl ShapeDescriptor {
    /// A shape of `kind` at `position` with the given radii in meters.
    pub fn new(
        kind: ShapeKind,
        position: GeoPosition,
        north_south_radius: f64,
        vertical_radius: f64,
        east_west_radius: f64,
    ) -> Result<Self, ShapeError> {
        validate_position(&position)?;
        validate_radii(north_south_radius, vertical_radius, east_west_radius)?;
        Ok(Self {
            kind,
            position,
            altitude_mode: AltitudeMode::default(),
            north_south_radius,
            vertical_radius,
            east_west_radius,
            rotation: Rotation::default(),
            north_south_scale: 1.0,
            vertical_scale: 1.0,
            east_west_scale: 1.0,
            detail_hint: 0.0,
            texture: None,
            facing: Facing::Outside,
            attributes: ShapeAttributes::default(),
        })
    }

    pub fn ellipsoid(
        position: GeoPosition,
        north_south_radius: f64,
        vertical_radius: f64,
        east_west_radius: f64,
    ) -> Result<Self, ShapeError> {
        Self::new(
            ShapeKind::Ellipsoid,
            position,
            north_south_radius,
            vertical_radius,
            east_west_radius,
        )
    }

    /// A sphere of `radius` meters.
    pub fn sphere(position: GeoPosition, radius: f64) -> Result<Self, ShapeError> {
        Self::ellipsoid(position, radius, radius, radius)
    }

    pub fn pyramid(
        position: GeoPosition,
        north_south_radius: f64,
        vertical_radius: f64,
        east_west_radius: f64,
    ) -> Result<Self, ShapeError> {
        Self::new(
            ShapeKind::Pyramid,
            position,
            north_south_radius,
            vertical_radius,
            east_west_radius,
        )
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn position(&self) -> &GeoPosition {
        &self.position
    }

    pub fn altitude_mode(&self) -> AltitudeMode {
        self.altitude_mode
    }

    pub fn north_south_radius(&self) -> f64 {
        self.north_south_radius
    }

    pub fn vertical_radius(&self) -> f64 {
        self.vertical_radius
    }

    pub fn east_west_radius(&self) -> f64 {
        self.east_west_radius
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Scale factors as `(north_south, vertical, east_west)`.
    pub fn scale(&self) -> (f64, f64, f64) {
        (self.north_south_scale, self.vertical_scale, self.east_west_scale)
    }

    /// Final half-lengths in object space order: east-west (X),
    /// north-south (Y), vertical (Z).
    pub fn scaled_radii(&self) -> DVec3 {
        DVec3::new(
            self.east_west_radius * self.east_west_scale,
            self.north_south_radius * self.north_south_scale,
            self.vertical_radius * self.vertical_scale,
        )
    }

    pub fn detail_hint(&self) -> f64 {
        self.detail_hint
    }

    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref()
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn attributes(&self) -> &ShapeAttributes {
        &self.attributes
    }

    /// Mutable access to drawing attributes. These do not affect geometry.
    pub fn attributes_mut(&mut self) -> &mut ShapeAttributes {
        &mut self.attributes
    }

    /// Counter bumped by every accepted geometry change.
    pub fn set_position(&mut self, position: GeoPosition) -> Result<(), ShapeError> {
        validate_position(&position)?;
        self.position = position;
        Ok(())
    }

    pub fn set_altitude_mode(&mut self, mode: AltitudeMode) {
        self.altitude_mode = mode;
    }

    /// Set all three radii. Rejects the whole update if any is invalid.
    pub fn set_radii(
        &mut self,
        north_south: f64,
        vertical: f64,
        east_west: f64,
    ) -> Result<(), ShapeError> {
        validate_radii(north_south, vertical, east_west)?;
        self.north_south_radius = north_south;
        self.vertical_radius = vertical;
        self.east_west_radius = east_west;
        Ok(())
    }

    pub fn set_north_south_radius(&mut self, radius: f64) -> Result<(), ShapeError> {
        self.set_radii(radius, self.vertical_radius, self.east_west_radius)
    }

    pub fn set_vertical_radius(&mut self, radius: f64) -> Result<(), ShapeError> {
        self.set_radii(self.north_south_radius, radius, self.east_west_radius)
    }

    pub fn set_east_west_radius(&mut self, radius: f64) -> Result<(), ShapeError> {
        self.set_radii(self.north_south_radius, self.vertical_radius, radius)
    }

    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), ShapeError> {
        rotation.validate()?;
        self.rotation = rotation;
        Ok(())
    }

    pub fn set_heading(&mut self, heading: Option<f64>) -> Result<(), ShapeError> {
        self.set_rotation(Rotation {
            heading,
            ..self.rotation
        })
    }

    pub fn set_tilt(&mut self, tilt: Option<f64>) -> Result<(), ShapeError> {
        self.set_rotation(Rotation { tilt, ..self.rotation })
    }

    pub fn set_roll(&mut self, roll: Option<f64>) -> Result<(), ShapeError> {
        self.set_rotation(Rotation { roll, ..self.rotation })
    }

    /// Set the per-axis scale factors. Rejects the whole update if any is invalid.
    pub fn set_scale(
        &mut self,
        north_south: f64,
        vertical: f64,
        east_west: f64,
    ) -> Result<(), ShapeError> {
        for (axis, value) in [
            (Axis::NorthSouth, north_south),
            (Axis::Vertical, vertical),
            (Axis::EastWest, east_west),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ShapeError::InvalidScale { axis, value });
            }
        }
        self.north_south_scale = north_south;
        self.vertical_scale = vertical;
        self.east_west_scale = east_west;
        Ok(())
    }

    /// Bias the level-of-detail choice. Positive values ask for more detail.
    pub fn set_detail_hint(&mut self, hint: f64) -> Result<(), ShapeError> {
        if !hint.is_finite() {
            return Err(ShapeError::InvalidDetailHint(hint));
        }
        self.detail_hint = hint;
        Ok(())
    }

    pub fn set_texture(&mut self, texture: Option<TextureRef>) {
        self.texture = texture;
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn set_attributes(&mut self, attributes: ShapeAttributes) {
        self.attributes = attributes;
    }
}

fn validate_position(position: &GeoPosition) -> Result<(), ShapeError> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(ShapeError::InvalidPosition {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: position.altitude,
        })
    }
}

fn validate_radii(north_south: f64, vertical: f64, east_west: f64) -> Result<(), ShapeError> {
    for (axis, value) in [
        (Axis::NorthSouth, north_south),
        (Axis::Vertical, vertical),
        (Axis::EastWest, east_west),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ShapeError::InvalidRadius { axis, value });
        }
    }
    Ok(())
}
