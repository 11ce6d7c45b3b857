//! Per-instance frame pipeline.
//!
//! Each frame a [`RenderSession`] walks one shape through: resolve the
//! reference point, select a subdivision count from the previous frame's
//! extent, fetch the canonical mesh from the shared cache, compute the render
//! matrix and extent, cull, and finally draw. Any step may end the frame
//! early; the reason is kept in [`RenderSession::last_outcome`] and the next
//! frame starts over.
//!
//! Only three things survive between frames: the extent diameter used for
//! level-of-detail, the cached placement (render matrix and extent, valid
//! while the shape's kind, scaled radii, rotation, reference point and
//! vertical exaggeration are unchanged), and the GPU buffers with their
//! dirty flag.

use std::fmt;
use std::sync::Arc;

use geosolid_config::Config;
use geosolid_lod::{LodSelector, LodThresholds};
use geosolid_math::OrientedBox;
use geosolid_mesh::{CachedMesh, GeometryCache, MeshKey, ShapeKind};
use geosolid_render::{Color, DrawStyle, GpuBackend, ShapeBuffers, TextureProvider};
use glam::{DMat4, DVec3};

use crate::descriptor::{Rotation, ShapeDescriptor};
use crate::transform::{compute_extent, compute_render_matrix};
use crate::view::ViewContext;

/// How a frame ended for one shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    /// Prepared and waiting for [`RenderSession::draw`].
    Ready,
    /// At least one draw call was issued.
    Drawn,
    /// The terrain under the shape is not available yet.
    NoReferencePoint,
    /// The extent covers fewer pixels than the configured minimum.
    TooSmall,
    /// The extent lies outside the view frustum.
    OutsideView,
    /// The selected mesh has no triangles.
    NoGeometry,
    /// Neither the interior nor the outline was drawable.
    NothingToDraw,
}

impl FrameOutcome {
    /// Returns `true` if the frame issued at least one draw call.
    pub fn was_drawn(self) -> bool {
        self == FrameOutcome::Drawn
    }
}

impl fmt::Display for FrameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameOutcome::Ready => "ready",
            FrameOutcome::Drawn => "drawn",
            FrameOutcome::NoReferencePoint => "no reference point",
            FrameOutcome::TooSmall => "too small",
            FrameOutcome::OutsideView => "outside view",
            FrameOutcome::NoGeometry => "no geometry",
            FrameOutcome::NothingToDraw => "nothing to draw",
        })
    }
}

/// Everything the render matrix and extent are computed from.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PlacementKey {
    kind: ShapeKind,
    scaled_radii: DVec3,
    rotation: Rotation,
    reference_point: DVec3,
    vertical_exaggeration: f64,
}

impl PlacementKey {
    fn of(shape: &ShapeDescriptor, reference_point: DVec3, vertical_exaggeration: f64) -> Self {
        Self {
            kind: shape.kind(),
            scaled_radii: shape.scaled_radii(),
            rotation: shape.rotation(),
            reference_point,
            vertical_exaggeration,
        }
    }
}

/// Render matrix and extent for one placement of the shape.
#[derive(Clone, Copy, Debug)]
struct Placement {
    key: PlacementKey,
    matrix: DMat4,
    extent: OrientedBox,
}

/// Rendering state of one shape instance.
///
/// `B` is the buffer type of the [`GpuBackend`] the shape draws with. The
/// buffers are owned by the session and freed when it is dropped.
pub struct RenderSession<B> {
    cache: Arc<GeometryCache>,
    lod: LodSelector,
    min_pixel_size: f64,
    buffers: ShapeBuffers<B>,
    placement: Option<Placement>,
    lod_diameter: Option<f64>,
    mesh: Option<Arc<CachedMesh>>,
    subdivisions: u32,
    eye_distance: f64,
    ready: bool,
    last_outcome: Option<FrameOutcome>,
    frames: u64,
}

impl<B> RenderSession<B> {
    /// A session drawing meshes from `cache`, with no minimum pixel size.
    pub fn new(cache: Arc<GeometryCache>, lod: LodSelector) -> Self {
        Self {
            cache,
            lod,
            min_pixel_size: 0.0,
            buffers: ShapeBuffers::new(),
            placement: None,
            lod_diameter: None,
            mesh: None,
            subdivisions: 0,
            eye_distance: 0.0,
            ready: false,
            last_outcome: None,
            frames: 0,
        }
    }

    /// A session calibrated from the `[lod]` and `[render]` sections.
    pub fn from_config(cache: Arc<GeometryCache>, config: &Config) -> Self {
        let thresholds = LodThresholds::from_config(&config.lod, config.render.max_subdivisions);
        Self::new(cache, LodSelector::new(thresholds))
            .with_min_pixel_size(config.render.min_pixel_size)
    }

    /// Skip shapes whose extent covers fewer than `pixels` pixels.
    pub fn with_min_pixel_size(mut self, pixels: f64) -> Self {
        self.min_pixel_size = if pixels.is_finite() { pixels.max(0.0) } else { 0.0 };
        self
    }

    /// Run the per-frame steps up to drawing. Returns `true` if the shape
    /// should be drawn this frame; otherwise [`last_outcome`](Self::last_outcome)
    /// says why not.
    pub fn prepare<V>(&mut self, shape: &ShapeDescriptor, view: &V) -> bool
    where
        V: ViewContext + ?Sized,
    {
        self.ready = false;
        self.frames += 1;

        let Some(reference_point) = view.reference_point(shape.position(), shape.altitude_mode())
        else {
            return self.skip(FrameOutcome::NoReferencePoint);
        };

        let placement_key =
            PlacementKey::of(shape, reference_point, view.vertical_exaggeration());
        if self.placement.is_some_and(|p| p.key != placement_key) {
            tracing::trace!(kind = %shape.kind(), "shape placement invalidated");
            self.placement = None;
        }

        self.eye_distance = view.eye_point().distance(reference_point);
        let pixel_size = view.pixel_size_at_distance(self.eye_distance);
        let subdivisions = self
            .lod
            .select(self.lod_diameter, pixel_size, shape.detail_hint());
        if subdivisions != self.subdivisions {
            tracing::debug!(
                kind = %shape.kind(),
                from = self.subdivisions,
                to = subdivisions,
                "level of detail changed"
            );
        }
        self.subdivisions = subdivisions;

        let key = MeshKey::with_facing(shape.kind(), subdivisions, shape.facing());
        let mesh = self.cache.get_or_tessellate(key);
        self.buffers.select(key);
        let has_geometry = mesh.has_geometry();
        self.mesh = Some(mesh);

        let extent = match self.placement {
            Some(placement) => placement.extent,
            None => {
                let frame = view.surface_frame(shape.position(), reference_point);
                let matrix = compute_render_matrix(shape, frame);
                let extent = compute_extent(&matrix, reference_point, shape.kind());
                self.placement = Some(Placement {
                    key: placement_key,
                    matrix,
                    extent,
                });
                extent
            }
        };
        self.lod_diameter = Some(extent.diameter());

        if self.min_pixel_size > 0.0
            && pixel_size > 0.0
            && extent.diameter() / pixel_size < self.min_pixel_size
        {
            return self.skip(FrameOutcome::TooSmall);
        }
        if !view.intersects_frustum(&extent) {
            return self.skip(FrameOutcome::OutsideView);
        }
        if !has_geometry {
            return self.skip(FrameOutcome::NoGeometry);
        }

        self.ready = true;
        self.last_outcome = Some(FrameOutcome::Ready);
        true
    }

    /// Draw the shape prepared this frame. `shape` must be the descriptor
    /// passed to [`prepare`](Self::prepare).
    ///
    /// Uploads the selected mesh if the buffers are dirty, then issues the
    /// interior draw (when enabled and either a fill color is set or the
    /// texture resolves) and the outline draw (when enabled). An unresolved
    /// texture falls back to the fill color and is asked for again next frame.
    pub fn draw<G, T>(&mut self, shape: &ShapeDescriptor, gpu: &mut G, textures: &mut T) -> FrameOutcome
    where
        G: GpuBackend<Buffer = B>,
        T: TextureProvider + ?Sized,
    {
        if !self.ready {
            return self.last_outcome.unwrap_or(FrameOutcome::NothingToDraw);
        }
        self.ready = false;

        let (Some(mesh), Some(placement)) = (self.mesh.clone(), self.placement) else {
            self.skip(FrameOutcome::NothingToDraw);
            return FrameOutcome::NothingToDraw;
        };

        let attributes = shape.attributes();
        let interior = if attributes.draw_interior {
            let texture = shape.texture().and_then(|t| textures.resolve(t));
            match (attributes.interior_color, texture) {
                (None, None) => None,
                (color, texture) => Some(DrawStyle::Interior {
                    color: color.unwrap_or(Color::WHITE),
                    texture,
                }),
            }
        } else {
            None
        };
        let outline = attributes.draw_outline.then_some(DrawStyle::Outline {
            color: attributes.outline_color,
            width: attributes.outline_width,
        });
        if interior.is_none() && outline.is_none() {
            self.skip(FrameOutcome::NothingToDraw);
            return FrameOutcome::NothingToDraw;
        }

        self.buffers.sync(gpu, &mesh);
        let mut drawn = false;
        for style in [interior, outline].into_iter().flatten() {
            drawn |= self.buffers.draw(gpu, placement.matrix, style);
        }

        let outcome = if drawn {
            FrameOutcome::Drawn
        } else {
            FrameOutcome::NothingToDraw
        };
        tracing::trace!(
            key = %mesh.key(),
            %outcome,
            eye_distance = self.eye_distance,
            "shape frame"
        );
        self.last_outcome = Some(outcome);
        outcome
    }

    /// [`prepare`](Self::prepare) followed by [`draw`](Self::draw).
    pub fn render<V, G, T>(
        &mut self,
        shape: &ShapeDescriptor,
        view: &V,
        gpu: &mut G,
        textures: &mut T,
    ) -> FrameOutcome
    where
        V: ViewContext + ?Sized,
        G: GpuBackend<Buffer = B>,
        T: TextureProvider + ?Sized,
    {
        if self.prepare(shape, view) {
            self.draw(shape, gpu, textures)
        } else {
            self.last_outcome.unwrap_or(FrameOutcome::NothingToDraw)
        }
    }

    /// Free the GPU buffers now. The next draw re-uploads.
    pub fn release_gpu<G>(&mut self, gpu: &mut G)
    where
        G: GpuBackend<Buffer = B>,
    {
        self.buffers.release(gpu);
    }

    /// Bytes held in GPU buffers by this shape.
    pub fn gpu_bytes<G>(&self, gpu: &G) -> u64
    where
        G: GpuBackend<Buffer = B>,
    {
        self.buffers.gpu_bytes(gpu)
    }

    /// How the most recent frame ended.
    pub fn last_outcome(&self) -> Option<FrameOutcome> {
        self.last_outcome
    }

    /// Subdivision count selected in the most recent frame.
    pub fn subdivisions(&self) -> u32 {
        self.subdivisions
    }

    /// Mesh selected in the most recent frame.
    pub fn mesh(&self) -> Option<&Arc<CachedMesh>> {
        self.mesh.as_ref()
    }

    /// World-space extent of the current placement.
    pub fn extent(&self) -> Option<&OrientedBox> {
        self.placement.as_ref().map(|p| &p.extent)
    }

    /// Object-to-world matrix of the current placement.
    pub fn render_matrix(&self) -> Option<DMat4> {
        self.placement.map(|p| p.matrix)
    }

    /// Distance from the eye to the reference point in the most recent frame.
    pub fn eye_distance(&self) -> f64 {
        self.eye_distance
    }

    /// Returns `true` if the selected mesh differs from what the GPU holds.
    pub fn is_gpu_dirty(&self) -> bool {
        self.buffers.is_dirty()
    }

    /// How many times mesh data was uploaded to the GPU.
    pub fn upload_count(&self) -> u64 {
        self.buffers.upload_count()
    }

    /// Frames passed through [`prepare`](Self::prepare).
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// The geometry cache this session fetches meshes from.
    pub fn cache(&self) -> &Arc<GeometryCache> {
        &self.cache
    }

    fn skip(&mut self, outcome: FrameOutcome) -> bool {
        tracing::trace!(%outcome, frame = self.frames, "shape skipped");
        self.ready = false;
        self.last_outcome = Some(outcome);
        false
    }
}
