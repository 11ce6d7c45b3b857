//! Command-line argument parsing for the geosolid driver.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// geosolid command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "geosolid", about = "Globe-anchored volumetric shape renderer")]
pub struct CliArgs {
    /// Geometry cache ceiling in bytes.
    #[arg(long)]
    pub cache_capacity: Option<u64>,

    /// Upper bound for tessellation subdivisions.
    #[arg(long)]
    pub max_subdivisions: Option<u32>,

    /// Default detail hint, typically in [-0.5, 0.5].
    #[arg(long, allow_negative_numbers = true)]
    pub detail_hint: Option<f64>,

    /// Minimum projected size in pixels for a shape to be drawn.
    #[arg(long)]
    pub min_pixel_size: Option<f64>,

    /// Number of frames the driver simulates.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Render offscreen through wgpu instead of recording draws on the CPU.
    #[arg(long)]
    pub gpu: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(bytes) = args.cache_capacity {
            self.cache.capacity_bytes = bytes;
        }
        if let Some(max) = args.max_subdivisions {
            self.render.max_subdivisions = max;
        }
        if let Some(hint) = args.detail_hint {
            self.lod.detail_hint = hint;
        }
        if let Some(px) = args.min_pixel_size {
            self.render.min_pixel_size = px;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
