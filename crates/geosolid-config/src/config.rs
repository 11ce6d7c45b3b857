//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name the config is stored under inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Per-shape rendering settings.
    pub render: RenderConfig,
    /// Level-of-detail calibration.
    pub lod: LodConfig,
    /// Shared geometry cache sizing.
    pub cache: CacheConfig,
    /// Viewer/camera settings used by the headless driver.
    pub view: ViewConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound for the tessellation subdivision count.
    pub max_subdivisions: u32,
    /// Shapes whose extent projects to fewer pixels than this are not drawn.
    pub min_pixel_size: f64,
    /// Draw filled interiors by default.
    pub draw_interior: bool,
    /// Draw wireframe outlines by default.
    pub draw_outline: bool,
}

/// Level-of-detail calibration.
///
/// The two thresholds are empirically tuned; they are starting points, not
/// derived constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Vertex density at which a candidate subdivision count is accepted.
    pub base_threshold: f64,
    /// How far the detail hint moves the threshold (per unit of hint).
    pub threshold_range: f64,
    /// Detail hint applied to shapes that do not set their own.
    pub detail_hint: f64,
}

/// Geometry cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// High-water mark in bytes. Exceeding it triggers LRU eviction.
    pub capacity_bytes: u64,
    /// Fraction of the capacity that eviction shrinks the cache down to.
    pub low_water_ratio: f64,
}

/// Viewer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f64,
    /// Near clip distance in meters.
    pub near: f64,
    /// Far clip distance in meters.
    pub far: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log one line per shape per frame in the demo driver.
    pub log_frames: bool,
}

// --- Default implementations ---

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_subdivisions: 6,
            min_pixel_size: 1.0,
            draw_interior: true,
            draw_outline: false,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.04,
            threshold_range: 0.039,
            detail_hint: 0.0,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: 32 * 1024 * 1024,
            low_water_ratio: 0.85,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            viewport_height: 720,
            fov_y_degrees: 45.0,
            near: 1.0,
            far: 1.0e8,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_frames: false,
        }
    }
}

/// Platform config directory for geosolid, e.g. `~/.config/geosolid`.
///
/// Falls back to `./config` when the platform has no config directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("geosolid"))
        .unwrap_or_else(|| PathBuf::from("config"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let write_error = |source| ConfigError::Write {
            path: config_path.clone(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(write_error)?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if !(self.cache.low_water_ratio > 0.0 && self.cache.low_water_ratio <= 1.0) {
            return invalid("cache.low_water_ratio", "must be in (0, 1]");
        }
        if !self.lod.base_threshold.is_finite() || self.lod.base_threshold <= 0.0 {
            return invalid("lod.base_threshold", "must be positive");
        }
        if !self.lod.threshold_range.is_finite() || !self.lod.detail_hint.is_finite() {
            return invalid("lod", "threshold_range and detail_hint must be finite");
        }
        if self.render.min_pixel_size.is_nan() || self.render.min_pixel_size < 0.0 {
            return invalid("render.min_pixel_size", "must not be negative");
        }
        if self.view.viewport_width == 0 || self.view.viewport_height == 0 {
            return invalid("view", "viewport must be at least one pixel");
        }
        if !(self.view.near > 0.0 && self.view.far > self.view.near) {
            return invalid("view", "need 0 < near < far");
        }
        if !(self.view.fov_y_degrees > 0.0 && self.view.fov_y_degrees < 180.0) {
            return invalid("view.fov_y_degrees", "must be in (0, 180)");
        }
        Ok(())
    }

    fn read(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let config: Config = ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
