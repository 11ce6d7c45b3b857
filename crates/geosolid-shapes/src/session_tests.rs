use std::sync::Arc;

use geosolid_config::{Config, ViewConfig};
use geosolid_lod::LodSelector;
use geosolid_math::{AltitudeMode, ElevationModel, FlatTerrain, GeoPosition, Globe};
use geosolid_mesh::{
    DEFAULT_CAPACITY_BYTES, Facing, GeometryCache, MAX_SUBDIVISIONS, MeshKey, ShapeKind, tessellate,
};
use geosolid_render::{
    Camera, Color, DrawStyle, HeadlessBackend, HeadlessBuffer, NoTextures, StaticTextures,
    TextureId, TextureRef,
};
use glam::DVec3;

use crate::descriptor::{Rotation, ShapeDescriptor};
use crate::session::{FrameOutcome, RenderSession};
use crate::view::GlobeView;

fn place() -> GeoPosition {
    GeoPosition::new(40.0, -105.0, 0.0)
}

fn new_cache() -> Arc<GeometryCache> {
    Arc::new(GeometryCache::new(DEFAULT_CAPACITY_BYTES))
}

fn session(cache: &Arc<GeometryCache>) -> RenderSession<HeadlessBuffer> {
    RenderSession::new(Arc::clone(cache), LodSelector::default()).with_min_pixel_size(1.0)
}

/// Camera `distance` meters straight above the shape, looking down at it.
fn camera_above(globe: &Globe, shape: &ShapeDescriptor, distance: f64) -> Camera {
    let p = shape.position();
    let target = globe.point_at(p.latitude, p.longitude, p.altitude);
    let eye = globe.point_at(p.latitude, p.longitude, p.altitude + distance);
    let mut camera = Camera::from_config(&ViewConfig::default());
    camera.look_at(eye, target, DVec3::Z);
    camera
}

fn view_from_above(shape: &ShapeDescriptor, distance: f64) -> GlobeView {
    let globe = Globe::wgs84();
    let camera = camera_above(&globe, shape, distance);
    GlobeView::new(globe, camera, FlatTerrain::new(0.0))
}

/// Run `frames` frames and return the outcome of the last one.
fn run(
    session: &mut RenderSession<HeadlessBuffer>,
    shape: &ShapeDescriptor,
    view: &GlobeView,
    gpu: &mut HeadlessBackend,
    frames: usize,
) -> FrameOutcome {
    let mut outcome = FrameOutcome::NothingToDraw;
    for _ in 0..frames {
        gpu.take_draws();
        outcome = session.render(shape, view, gpu, &mut NoTextures);
    }
    outcome
}

// A 1 m sphere spans 2*sqrt(3) m of extent diagonal; at 300 m with a 45 degree
// field of view over 720 pixels that is about 10 pixels.
const FAR_DISTANCE: f64 = 300.0;
const NEAR_DISTANCE: f64 = 3.0;

#[test]
fn test_distant_sphere_uses_coarsest_mesh() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, FAR_DISTANCE);
    let mut session = session(&cache);

    let outcome = run(&mut session, &shape, &view, &mut gpu, 2);
    assert!(outcome.was_drawn());
    assert!(Arc::ptr_eq(session.cache(), &cache));
    assert_eq!(session.subdivisions(), 0);

    let expected = tessellate(MeshKey::new(ShapeKind::Ellipsoid, 0));
    let mesh = session.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), expected.vertex_count());
    assert_eq!(gpu.draws().len(), 1);
    assert_eq!(gpu.draws()[0].index_count as usize, expected.index_count());
}

#[test]
fn test_closer_sphere_never_gets_coarser() {
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let mut previous = 0;
    for distance in [FAR_DISTANCE, FAR_DISTANCE / 2.0, 30.0, 10.0, NEAR_DISTANCE] {
        let cache = new_cache();
        let mut gpu = HeadlessBackend::new();
        let mut session = session(&cache);
        let view = view_from_above(&shape, distance);
        run(&mut session, &shape, &view, &mut gpu, 2);

        assert!(
            session.subdivisions() >= previous,
            "{distance} m: {} < {previous}",
            session.subdivisions()
        );
        previous = session.subdivisions();
    }
    assert!(previous > 0, "a sphere filling the view should be refined");
}

#[test]
fn test_first_frame_defers_to_coarsest() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, NEAR_DISTANCE);
    let mut session = session(&cache);

    run(&mut session, &shape, &view, &mut gpu, 1);
    assert_eq!(session.subdivisions(), 0);
    run(&mut session, &shape, &view, &mut gpu, 1);
    assert!(session.subdivisions() > 0);
}

#[test]
fn test_instances_share_cached_mesh() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let a = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let b = ShapeDescriptor::sphere(GeoPosition::new(40.0, -105.0, 0.5), 1.0).unwrap();
    let view = view_from_above(&a, FAR_DISTANCE);

    let mut first = session(&cache);
    let mut second = session(&cache);
    run(&mut first, &a, &view, &mut gpu, 2);
    run(&mut second, &b, &view, &mut gpu, 2);

    assert_eq!(first.subdivisions(), second.subdivisions());
    assert!(Arc::ptr_eq(first.mesh().unwrap(), second.mesh().unwrap()));
    let stats = cache.stats();
    assert_eq!(stats.builds, 1);
    assert_eq!(stats.entries, 1);
    assert!(stats.hits >= 3);
}

#[test]
fn test_dirty_flag_follows_level_changes() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, NEAR_DISTANCE);
    let mut session = session(&cache);

    // Frame 1: nothing bound yet.
    assert!(session.prepare(&shape, &view));
    assert!(session.is_gpu_dirty());
    session.draw(&shape, &mut gpu, &mut NoTextures);
    assert!(!session.is_gpu_dirty());
    let first_level = session.subdivisions();

    // Frame 2: the extent is known now and the level rises.
    assert!(session.prepare(&shape, &view));
    assert_ne!(session.subdivisions(), first_level);
    assert!(session.is_gpu_dirty());
    assert_eq!(session.draw(&shape, &mut gpu, &mut NoTextures), FrameOutcome::Drawn);
    assert!(!session.is_gpu_dirty());
    assert_eq!(session.upload_count(), 2);

    // Frames 3..: same level, no uploads.
    for _ in 0..3 {
        assert!(session.prepare(&shape, &view));
        assert!(!session.is_gpu_dirty());
        session.draw(&shape, &mut gpu, &mut NoTextures);
    }
    assert_eq!(session.upload_count(), 2);
}

#[test]
fn test_missing_terrain_skips_frame() {
    struct NotLoaded;
    impl ElevationModel for NotLoaded {
        fn elevation(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
            None
        }
    }

    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    shape.set_altitude_mode(AltitudeMode::ClampToSurface);
    let globe = Globe::wgs84();
    let camera = camera_above(&globe, &shape, FAR_DISTANCE);
    let view = GlobeView::new(globe, camera, NotLoaded);
    let mut session = session(&cache);

    let outcome = session.render(&shape, &view, &mut gpu, &mut NoTextures);
    assert_eq!(outcome, FrameOutcome::NoReferencePoint);
    assert!(session.extent().is_none());
    assert!(cache.is_empty());
    assert_eq!(gpu.stats().buffers_created, 0);
}

#[test]
fn test_tiny_shape_is_culled() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, 1.0e6);
    let mut session = session(&cache);

    assert_eq!(run(&mut session, &shape, &view, &mut gpu, 1), FrameOutcome::TooSmall);
    assert!(session.extent().is_some());
    assert_eq!(gpu.stats().draws(), 0);
}

#[test]
fn test_shape_behind_camera_is_culled() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let globe = Globe::wgs84();
    let mut camera = camera_above(&globe, &shape, FAR_DISTANCE);
    let eye = camera.position;
    let up = globe.surface_normal(40.0, -105.0);
    camera.look_at(eye, eye + up, DVec3::Z);
    let view = GlobeView::new(globe, camera, FlatTerrain::new(0.0));
    let mut session = session(&cache);

    assert_eq!(run(&mut session, &shape, &view, &mut gpu, 1), FrameOutcome::OutsideView);
    assert_eq!(gpu.stats().buffers_created, 0);
}

#[test]
fn test_interior_and_outline_draws() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::pyramid(place(), 2.0, 3.0, 2.0).unwrap();
    shape.attributes_mut().draw_outline = true;
    shape.attributes_mut().outline_color = Color::WHITE;
    shape.attributes_mut().outline_width = 2.0;
    let view = view_from_above(&shape, 100.0);
    let mut session = session(&cache);

    assert_eq!(run(&mut session, &shape, &view, &mut gpu, 1), FrameOutcome::Drawn);
    let draws = gpu.take_draws();
    assert_eq!(draws.len(), 2);
    assert!(matches!(draws[0].style, DrawStyle::Interior { texture: None, .. }));
    assert_eq!(
        draws[1].style,
        DrawStyle::Outline {
            color: Color::WHITE,
            width: 2.0
        }
    );
    assert_eq!(Some(draws[0].model), session.render_matrix());
}

#[test]
fn test_nothing_enabled_draws_nothing() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    shape.attributes_mut().draw_interior = false;
    let view = view_from_above(&shape, FAR_DISTANCE);
    let mut session = session(&cache);

    assert_eq!(run(&mut session, &shape, &view, &mut gpu, 1), FrameOutcome::NothingToDraw);
    assert_eq!(gpu.stats().buffers_created, 0);
    assert!(session.is_gpu_dirty());
}

#[test]
fn test_texture_resolution() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    shape.set_texture(Some(TextureRef::from("marble.png")));
    let view = view_from_above(&shape, FAR_DISTANCE);
    let mut session = session(&cache);
    let mut textures = StaticTextures::new();

    // Not loaded yet: falls back to the fill color.
    let outcome = session.render(&shape, &view, &mut gpu, &mut textures);
    assert_eq!(outcome, FrameOutcome::Drawn);
    assert!(matches!(
        gpu.take_draws()[0].style,
        DrawStyle::Interior { texture: None, .. }
    ));

    // Without a fill color an unresolved texture leaves nothing to draw.
    shape.attributes_mut().interior_color = None;
    let outcome = session.render(&shape, &view, &mut gpu, &mut textures);
    assert_eq!(outcome, FrameOutcome::NothingToDraw);
    assert_eq!(textures.misses(), 2);

    textures.insert(TextureRef::from("marble.png"), TextureId(7));
    let outcome = session.render(&shape, &view, &mut gpu, &mut textures);
    assert_eq!(outcome, FrameOutcome::Drawn);
    assert_eq!(
        gpu.take_draws()[0].style,
        DrawStyle::Interior {
            color: Color::WHITE,
            texture: Some(TextureId(7))
        }
    );
}

#[test]
fn test_geometry_change_replaces_placement() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, 100.0);
    let mut session = session(&cache);

    run(&mut session, &shape, &view, &mut gpu, 1);
    let before = *session.extent().unwrap();
    let level = session.subdivisions();

    shape.set_east_west_radius(5.0).unwrap();
    run(&mut session, &shape, &view, &mut gpu, 1);
    let after = *session.extent().unwrap();
    assert!((after.half_extents.x - 5.0).abs() < 1e-6);
    assert!(after.diameter() > before.diameter());
    assert!(session.subdivisions() >= level);

    // An unchanged descriptor keeps the placement.
    let matrix = session.render_matrix();
    run(&mut session, &shape, &view, &mut gpu, 1);
    assert_eq!(session.render_matrix(), matrix);
}

#[test]
fn test_fresh_descriptor_replaces_placement() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let small = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&small, 100.0);
    let mut session = session(&cache);

    run(&mut session, &small, &view, &mut gpu, 1);
    assert!((session.extent().unwrap().half_extents - DVec3::ONE).abs().max_element() < 1e-6);

    // Same position, new descriptor: the session must not keep the 1 m placement.
    let large = ShapeDescriptor::sphere(place(), 10.0).unwrap();
    run(&mut session, &large, &view, &mut gpu, 1);
    let half = session.extent().unwrap().half_extents;
    assert!((half - DVec3::splat(10.0)).abs().max_element() < 1e-6, "{half}");

    let unrotated = session.render_matrix();
    let mut turned = ShapeDescriptor::sphere(place(), 10.0).unwrap();
    turned.set_rotation(Rotation::heading(90.0)).unwrap();
    run(&mut session, &turned, &view, &mut gpu, 1);
    assert_ne!(session.render_matrix(), unrotated);
}

#[test]
fn test_eye_at_reference_point_uses_finest_mesh() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 50.0).unwrap();
    shape.set_facing(Facing::Inside);

    let globe = Globe::wgs84();
    let p = shape.position();
    let center = globe.point_at(p.latitude, p.longitude, p.altitude);
    let north = globe.point_at(p.latitude + 0.001, p.longitude, p.altitude);
    let mut camera = Camera::from_config(&ViewConfig::default());
    camera.look_at(center, north, globe.surface_normal(p.latitude, p.longitude));
    let view = GlobeView::new(globe, camera, FlatTerrain::new(0.0));
    let mut session = session(&cache);

    assert_eq!(run(&mut session, &shape, &view, &mut gpu, 3), FrameOutcome::Drawn);
    assert!(session.eye_distance() < 1e-6);
    assert_eq!(session.subdivisions(), MAX_SUBDIVISIONS);
}

#[test]
fn test_inside_facing_uses_its_own_mesh() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    shape.set_facing(Facing::Inside);
    let view = view_from_above(&shape, FAR_DISTANCE);
    let mut session = session(&cache);

    run(&mut session, &shape, &view, &mut gpu, 1);
    assert_eq!(session.mesh().unwrap().key().facing(), Facing::Inside);
    assert!(cache.contains(&MeshKey::with_facing(ShapeKind::Ellipsoid, 0, Facing::Inside)));
    assert!(!cache.contains(&MeshKey::new(ShapeKind::Ellipsoid, 0)));
}

#[test]
fn test_release_and_drop_free_buffers() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, FAR_DISTANCE);

    let mut session = session(&cache);
    run(&mut session, &shape, &view, &mut gpu, 1);
    assert_eq!(gpu.live_buffers(), 2);
    assert!(session.gpu_bytes(&gpu) > 0);

    session.release_gpu(&mut gpu);
    assert_eq!(gpu.live_buffers(), 0);
    run(&mut session, &shape, &view, &mut gpu, 1);
    assert_eq!(gpu.live_buffers(), 2);
    assert_eq!(session.upload_count(), 2);

    drop(session);
    assert_eq!(gpu.live_buffers(), 0);
    assert_eq!(cache.len(), 1, "meshes outlive the instances using them");
}

#[test]
fn test_from_config_applies_thresholds() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let mut config = Config::default();
    config.render.max_subdivisions = 2;
    config.render.min_pixel_size = 0.0;
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, NEAR_DISTANCE);
    let mut session = RenderSession::<HeadlessBuffer>::from_config(Arc::clone(&cache), &config);

    run(&mut session, &shape, &view, &mut gpu, 2);
    assert_eq!(session.subdivisions(), 2);

    // Without a minimum size even a speck is drawn.
    let far = view_from_above(&shape, 1.0e6);
    assert_eq!(run(&mut session, &shape, &far, &mut gpu, 1), FrameOutcome::Drawn);
}

#[test]
fn test_draw_without_prepare_reports_last_outcome() {
    let cache = new_cache();
    let mut gpu = HeadlessBackend::new();
    let shape = ShapeDescriptor::sphere(place(), 1.0).unwrap();
    let view = view_from_above(&shape, 1.0e6);
    let mut session = session(&cache);

    assert!(!session.prepare(&shape, &view));
    assert_eq!(
        session.draw(&shape, &mut gpu, &mut NoTextures),
        FrameOutcome::TooSmall
    );
    assert_eq!(gpu.stats().draws(), 0);
    assert_eq!(session.frame_count(), 1);
}
