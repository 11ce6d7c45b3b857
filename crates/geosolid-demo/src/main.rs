//! Driver that flies a camera toward a few shapes and reports what the
//! renderer did.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p geosolid-demo -- --frames 240` to record draws on the
//! CPU, or add `--gpu` to render offscreen through wgpu.

mod scene;
mod target;

use std::sync::Arc;

use clap::Parser;
use geosolid_config::{CliArgs, Config, default_config_dir};
use geosolid_math::{FlatTerrain, Globe};
use geosolid_mesh::GeometryCache;
use geosolid_render::{GpuBackend, request_device};
use geosolid_shapes::{FrameOutcome, GlobeView};
use tracing::{debug, info, warn};

use crate::scene::{OutcomeTally, SITE_ELEVATION, Scene, camera_at};
use crate::target::{FrameTarget, HeadlessTarget, OffscreenTarget};

const DEFAULT_FRAMES: u32 = 180;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    geosolid_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);
    let cache = GeometryCache::shared_from_config(&config.cache);
    info!(
        frames,
        capacity = config.cache.capacity_bytes,
        max_subdivisions = config.render.max_subdivisions,
        "starting geosolid demo"
    );

    if args.gpu {
        match pollster::block_on(request_device()) {
            Ok((device, queue)) => {
                let target = OffscreenTarget::new(
                    device,
                    queue,
                    config.view.viewport_width,
                    config.view.viewport_height,
                );
                run(target, &cache, &config, frames);
                return;
            }
            Err(e) => warn!("{e}, falling back to headless rendering"),
        }
    }
    run(HeadlessTarget::new(), &cache, &config, frames);
}

fn run<T: FrameTarget>(mut target: T, cache: &Arc<GeometryCache>, config: &Config, frames: u32) {
    let mut scene = match Scene::<<T::Gpu as GpuBackend>::Buffer>::build(cache, config) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Failed to build scene: {e}");
            return;
        }
    };

    let globe = Globe::wgs84();
    let mut view = GlobeView::new(
        globe,
        camera_at(&globe, config, 0, frames),
        FlatTerrain::new(SITE_ELEVATION),
    );
    let mut textures = target.textures();
    let mut tally = OutcomeTally::default();
    let mut total_draws = 0;

    for frame in 0..frames {
        let camera = camera_at(&globe, config, frame, frames);
        target.begin_frame(&camera);
        view.set_camera(camera);

        for instance in &mut scene.instances {
            let outcome =
                instance
                    .session
                    .render(&instance.shape, &view, target.gpu(), &mut textures);
            tally.record(outcome);
            if config.debug.log_frames {
                info!(
                    frame,
                    shape = instance.name,
                    %outcome,
                    subdivisions = instance.session.subdivisions(),
                    eye_distance = instance.session.eye_distance(),
                    "shape"
                );
            }
        }

        let draws = target.end_frame();
        total_draws += draws;
        debug!(frame, draws, "frame done");
    }

    for instance in &scene.instances {
        info!(
            shape = instance.name,
            kind = %instance.shape.kind(),
            subdivisions = instance.session.subdivisions(),
            uploads = instance.session.upload_count(),
            gpu_bytes = instance.session.gpu_bytes(target.gpu()),
            last = ?instance.session.last_outcome(),
            "final state"
        );
    }

    let stats = cache.stats();
    info!(
        entries = stats.entries,
        size_bytes = stats.size_bytes,
        hits = stats.hits,
        misses = stats.misses,
        builds = stats.builds,
        evictions = stats.evictions,
        hit_rate = format_args!("{:.1}%", stats.hit_rate() * 100.0),
        "geometry cache"
    );
    for (outcome, count) in tally.iter() {
        info!(outcome, count, "frame outcomes");
    }
    info!(
        total_draws,
        drawn = tally.count(FrameOutcome::Drawn),
        "{}",
        target.describe()
    );
}
