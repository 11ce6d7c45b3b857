//! Configuration system for geosolid.
//!
//! Runtime-tunable settings for shape rendering (LOD calibration, geometry cache
//! ceiling, cull thresholds, view parameters) persisted to disk as RON files,
//! with CLI overrides via clap and hot-reload detection.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CacheConfig, Config, DebugConfig, LodConfig, RenderConfig, ViewConfig,
    default_config_dir,
};
pub use error::ConfigError;
