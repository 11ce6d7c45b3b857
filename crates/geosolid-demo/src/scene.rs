//! The demo scene: a handful of shapes around one site and a camera that
//! descends toward them.

use std::collections::BTreeMap;
use std::sync::Arc;

use geosolid_config::Config;
use geosolid_math::{AltitudeMode, GeoPosition, Globe};
use geosolid_mesh::GeometryCache;
use geosolid_render::{Camera, Color, TextureRef};
use geosolid_shapes::{
    FrameOutcome, Rotation, RenderSession, ShapeAttributes, ShapeDescriptor, ShapeError,
};

/// Site the shapes are placed around.
pub const SITE_LATITUDE: f64 = 46.55;
pub const SITE_LONGITUDE: f64 = 7.98;
/// Terrain elevation at the site in meters.
pub const SITE_ELEVATION: f64 = 1500.0;

/// Texture the spindle asks for.
pub const CHECKER_TEXTURE: &str = "checker";

const START_HEIGHT: f64 = 40_000.0;
const END_HEIGHT: f64 = 250.0;

pub struct Instance<B> {
    pub name: &'static str,
    pub shape: ShapeDescriptor,
    pub session: RenderSession<B>,
}

pub struct Scene<B> {
    pub instances: Vec<Instance<B>>,
}

impl<B> Scene<B> {
    /// Build the scene's shapes, all drawing from `cache`.
    pub fn build(cache: &Arc<GeometryCache>, config: &Config) -> Result<Self, ShapeError> {
        let attributes = ShapeAttributes::from_config(&config.render);
        let at = |north: f64, east: f64, altitude: f64| {
            GeoPosition::new(
                SITE_LATITUDE + north / 111_000.0,
                SITE_LONGITUDE + east / 76_000.0,
                altitude,
            )
        };

        let mut dome = ShapeDescriptor::ellipsoid(at(0.0, 0.0, 0.0), 120.0, 60.0, 120.0)?;
        dome.set_altitude_mode(AltitudeMode::ClampToSurface);

        let mut balloon = ShapeDescriptor::sphere(at(300.0, -200.0, 400.0), 25.0)?;
        balloon.set_altitude_mode(AltitudeMode::RelativeToSurface);

        let mut spindle = ShapeDescriptor::ellipsoid(at(-250.0, 250.0, 120.0), 20.0, 120.0, 20.0)?;
        spindle.set_altitude_mode(AltitudeMode::RelativeToSurface);
        spindle.set_rotation(Rotation {
            tilt: Some(30.0),
            ..Rotation::default()
        })?;
        spindle.set_texture(Some(TextureRef::from(CHECKER_TEXTURE)));

        let mut pyramid = ShapeDescriptor::pyramid(at(-200.0, -300.0, 0.0), 80.0, 90.0, 80.0)?;
        pyramid.set_altitude_mode(AltitudeMode::ClampToSurface);
        pyramid.set_rotation(Rotation::heading(45.0))?;
        pyramid.set_scale(1.0, 1.0, 1.5)?;

        let mut far_marker = ShapeDescriptor::pyramid(at(8_000.0, 8_000.0, 3_000.0), 5.0, 10.0, 5.0)?;
        far_marker.set_altitude_mode(AltitudeMode::Absolute);

        let mut instances = Vec::new();
        for (name, mut shape, color) in [
            ("dome", dome, Color::rgba(0.55, 0.7, 0.9, 0.8)),
            ("balloon", balloon, Color::rgba(0.95, 0.3, 0.2, 1.0)),
            ("spindle", spindle, Color::WHITE),
            ("pyramid", pyramid, Color::rgba(0.85, 0.75, 0.4, 1.0)),
            ("far-marker", far_marker, Color::rgba(0.2, 0.9, 0.3, 1.0)),
        ] {
            shape.set_attributes(ShapeAttributes {
                interior_color: Some(color),
                ..attributes.clone()
            });
            shape.set_detail_hint(config.lod.detail_hint)?;
            instances.push(Instance {
                name,
                shape,
                session: RenderSession::from_config(Arc::clone(cache), config),
            });
        }
        Ok(Self { instances })
    }
}

/// Camera for `frame` of `frames`: a descent from high above the site,
/// circling it once, always looking at the site center.
pub fn camera_at(globe: &Globe, config: &Config, frame: u32, frames: u32) -> Camera {
    let t = if frames > 1 {
        f64::from(frame) / f64::from(frames - 1)
    } else {
        1.0
    };
    // Geometric interpolation keeps the descent visually even.
    let height = START_HEIGHT * (END_HEIGHT / START_HEIGHT).powf(t);
    let angle = t * std::f64::consts::TAU;
    let offset = height * 0.8;

    let eye = globe.point_at(
        SITE_LATITUDE + offset * angle.cos() / 111_000.0,
        SITE_LONGITUDE + offset * angle.sin() / 76_000.0,
        SITE_ELEVATION + height,
    );
    let target = globe.point_at(SITE_LATITUDE, SITE_LONGITUDE, SITE_ELEVATION);

    let mut camera = Camera::from_config(&config.view);
    camera.look_at(eye, target, globe.surface_normal(SITE_LATITUDE, SITE_LONGITUDE));
    camera
}

/// Per-outcome counts over a run.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    counts: BTreeMap<String, u64>,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: FrameOutcome) {
        *self.counts.entry(outcome.to_string()).or_default() += 1;
    }

    pub fn count(&self, outcome: FrameOutcome) -> u64 {
        self.counts.get(&outcome.to_string()).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosolid_render::HeadlessBuffer;

    #[test]
    fn test_scene_builds() {
        let cache = Arc::new(GeometryCache::default());
        let scene = Scene::<HeadlessBuffer>::build(&cache, &Config::default()).unwrap();
        assert_eq!(scene.instances.len(), 5);
        assert!(scene.instances.iter().all(|i| i.shape.attributes().interior_color.is_some()));
    }

    #[test]
    fn test_camera_descends() {
        let globe = Globe::wgs84();
        let config = Config::default();
        let site = globe.point_at(SITE_LATITUDE, SITE_LONGITUDE, SITE_ELEVATION);
        let first = camera_at(&globe, &config, 0, 10).position.distance(site);
        let last = camera_at(&globe, &config, 9, 10).position.distance(site);
        assert!(first > last);
        assert!(last > END_HEIGHT * 0.99);
    }

    #[test]
    fn test_tally_counts() {
        let mut tally = OutcomeTally::default();
        tally.record(FrameOutcome::Drawn);
        tally.record(FrameOutcome::Drawn);
        tally.record(FrameOutcome::TooSmall);
        assert_eq!(tally.count(FrameOutcome::Drawn), 2);
        assert_eq!(tally.count(FrameOutcome::OutsideView), 0);
        assert_eq!(tally.iter().count(), 2);
    }
}
