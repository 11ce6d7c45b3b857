//! Screen-size based LOD selection with a calibrated density threshold.

use geosolid_config::LodConfig;
use geosolid_mesh::MAX_SUBDIVISIONS;

/// Calibration for density-based LOD selection.
///
/// A candidate subdivision count `c` is accepted once the density
/// `(c + 1)³ / screen_size` exceeds `base_threshold + hint * threshold_range`.
/// The defaults (0.04 and 0.039) are empirical starting points.
#[derive(Clone, Debug, PartialEq)]
pub struct LodThresholds {
    base_threshold: f64,
    threshold_range: f64,
    max_subdivisions: u32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            base_threshold: 0.04,
            threshold_range: 0.039,
            max_subdivisions: MAX_SUBDIVISIONS,
        }
    }
}

impl LodThresholds {
    /// Create custom thresholds.
    ///
    /// `max_subdivisions` is clamped to [`MAX_SUBDIVISIONS`].
    ///
    /// # Panics
    ///
    /// Panics if either threshold is not finite.
    pub fn custom(base_threshold: f64, threshold_range: f64, max_subdivisions: u32) -> Self {
        assert!(base_threshold.is_finite(), "base threshold must be finite");
        assert!(threshold_range.is_finite(), "threshold range must be finite");
        Self {
            base_threshold,
            threshold_range,
            max_subdivisions: max_subdivisions.min(MAX_SUBDIVISIONS),
        }
    }

    /// Thresholds from the `[lod]` config section and the render subdivision cap.
    ///
    /// Non-finite values fall back to the defaults with a warning instead of
    /// panicking, since they come from a user-edited file.
    pub fn from_config(lod: &LodConfig, max_subdivisions: u32) -> Self {
        let defaults = Self::default();
        let pick = |value: f64, fallback: f64, setting: &str| {
            if value.is_finite() {
                value
            } else {
                tracing::warn!(setting, value, fallback, "non-finite LOD threshold, using default");
                fallback
            }
        };
        Self::custom(
            pick(lod.base_threshold, defaults.base_threshold, "base_threshold"),
            pick(lod.threshold_range, defaults.threshold_range, "threshold_range"),
            max_subdivisions,
        )
    }

    /// Density threshold at detail hint 0.
    pub fn base_threshold(&self) -> f64 {
        self.base_threshold
    }

    /// Threshold change per unit of detail hint.
    pub fn threshold_range(&self) -> f64 {
        self.threshold_range
    }

    /// Highest subdivision count the selector returns.
    pub fn max_subdivisions(&self) -> u32 {
        self.max_subdivisions
    }

    /// The density a candidate must exceed for the given detail hint.
    pub fn threshold_density(&self, detail_hint: f64) -> f64 {
        self.base_threshold + detail_hint * self.threshold_range
    }
}

/// Chooses a subdivision count from projected screen size.
#[derive(Clone, Debug, Default)]
pub struct LodSelector {
    thresholds: LodThresholds,
}

impl LodSelector {
    /// Create a new LOD selector with the given thresholds.
    pub fn new(thresholds: LodThresholds) -> Self {
        Self { thresholds }
    }

    /// Select the subdivision count for a shape.
    ///
    /// `extent_diameter` is the diameter of the shape's extent from the
    /// previous frame, or `None` before the first extent exists.
    /// `pixel_size` is the world-space size of one pixel at the shape's
    /// distance from the eye.
    ///
    /// Returns 0 without an extent, for a zero or non-finite diameter, or for
    /// a negative or NaN pixel size. A pixel size of zero means the eye sits
    /// at the shape, which then fills the view, so the maximum is returned.
    /// Otherwise returns the first candidate whose vertex density exceeds the
    /// threshold, or the maximum if none does. The result never decreases as
    /// the projected size grows.
    pub fn select(&self, extent_diameter: Option<f64>, pixel_size: f64, detail_hint: f64) -> u32 {
        let Some(diameter) = extent_diameter else {
            return 0;
        };
        if !diameter.is_finite() || diameter <= 0.0 {
            return 0;
        }
        if pixel_size.is_nan() || pixel_size < 0.0 {
            return 0;
        }
        let screen_size = diameter / pixel_size;
        if screen_size.is_infinite() {
            return self.thresholds.max_subdivisions;
        }
        self.select_for_screen_size(screen_size, detail_hint)
    }

    /// Select the subdivision count for an extent spanning `screen_size` pixels.
    pub fn select_for_screen_size(&self, screen_size: f64, detail_hint: f64) -> u32 {
        if !screen_size.is_finite() || screen_size <= 0.0 {
            return 0;
        }
        let threshold = self.thresholds.threshold_density(detail_hint);
        let max = self.thresholds.max_subdivisions;
        (0..=max)
            .find(|&candidate| vertex_density(candidate, screen_size) > threshold)
            .unwrap_or(max)
    }

    /// Access the underlying thresholds.
    pub fn thresholds(&self) -> &LodThresholds {
        &self.thresholds
    }
}

/// Edge-count cubed per pixel of projected size.
fn vertex_density(candidate: u32, screen_size: f64) -> f64 {
    let edges = f64::from(candidate + 1);
    edges * edges * edges / screen_size
}
