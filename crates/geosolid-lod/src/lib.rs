//! Level-of-detail selection for procedural shapes.
//!
//! Picks a tessellation subdivision count from how large a shape's extent
//! appears on screen, biased per shape by a detail hint.

pub mod selector;

pub use selector::{LodSelector, LodThresholds};
