//! Progressive tile accumulation. Frames dispatch one accumulation task per
//! screen tile, tasks trace radiance samples into an
//! [`aperture_layout::TileOutput`], and the
//! sequencer merges the outputs into persistent [`aperture_layout::TileData`]
//! records after the frame barrier. Accumulated color is the running sum over
//! frames; the resolve pass divides by the sample count.

mod accumulator;
mod integrator;
mod intersect;
mod material;
mod random;
mod resolve;
mod sampling;
mod sequencer;
mod tile;

pub use accumulator::AccumulatorConfig;
pub use integrator::{BACKGROUND_COLOR, MAX_BOUNCES};
pub use resolve::resolve_rgba8;
pub use sequencer::{FrameInputs, FrameReport, FrameSequencer, Timer};
pub use tile::{TileGrid, TileState, MAX_TILE_BUFFER_BYTES};

use aperture_camera::{Camera, CameraError, LensParams};
use aperture_layout::{verify_layout, LayoutError};
use aperture_scene::{GeometryStore, SceneError, Triangle};
use glam::UVec2;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilerError {
    #[error("tile buffer of {requested} bytes exceeds the {limit} byte budget")]
    ResourceExhaustion { requested: usize, limit: usize },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Owns the scene, camera, tile grid and frame sequencer, and turns host
/// edits into the per-frame reset policy. Construction verifies the shared
/// record layouts before any tile memory is allocated.
pub struct TileRenderer {
    scene: GeometryStore,
    camera: Camera,
    grid: TileGrid,
    sequencer: FrameSequencer,
    camera_dirty: bool,
    geometry_dirty: bool,
    reset_requested: bool,
}

impl TileRenderer {
    pub fn new(resolution: UVec2, config: AccumulatorConfig) -> Result<Self, TilerError> {
        verify_layout()?;

        let grid = TileGrid::new(resolution)?;
        let mut camera = Camera::default();
        camera.set_aspect_ratio(resolution.x as f32 / resolution.y as f32);

        Ok(Self {
            scene: GeometryStore::new(),
            camera,
            grid,
            sequencer: FrameSequencer::new(config),
            camera_dirty: false,
            geometry_dirty: false,
            reset_requested: false,
        })
    }

    /// Replaces the scene geometry. On success accumulation restarts from
    /// zero next frame; on failure the previous scene keeps rendering.
    pub fn load_scene(&mut self, triangles: Vec<Triangle>) -> Result<(), TilerError> {
        self.scene.load(triangles)?;
        self.geometry_dirty = true;
        Ok(())
    }

    pub fn set_lens(&mut self, lens: LensParams) -> Result<(), TilerError> {
        self.camera.set_lens(lens)?;
        self.camera_dirty = true;
        Ok(())
    }

    /// Edits the camera through a closure and flags the change for the next
    /// frame's reset.
    pub fn update_camera(&mut self, edit: impl FnOnce(&mut Camera)) {
        edit(&mut self.camera);
        self.camera_dirty = true;
    }

    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Rebuilds the tile grid for a new framebuffer size. All records start
    /// over at zero samples.
    pub fn set_resolution(&mut self, resolution: UVec2) -> Result<(), TilerError> {
        self.grid = TileGrid::new(resolution)?;
        self.camera
            .set_aspect_ratio(resolution.x as f32 / resolution.y as f32);
        self.camera_dirty = true;
        Ok(())
    }

    /// Traces and merges one frame, consuming the pending change flags.
    pub fn render_frame(&mut self) -> FrameReport {
        let inputs = FrameInputs {
            camera_changed: std::mem::take(&mut self.camera_dirty),
            geometry_changed: std::mem::take(&mut self.geometry_dirty),
            reset_requested: std::mem::take(&mut self.reset_requested),
        };
        self.sequencer
            .advance_frame(&self.scene, &self.camera, &mut self.grid, inputs)
    }

    /// Tone-mapped RGBA8 view of the current accumulation state.
    pub fn resolve_rgba8(&self) -> Vec<u8> {
        resolve_rgba8(&self.grid, self.sequencer.config().background)
    }

    pub fn resolution(&self) -> UVec2 {
        self.grid.resolution()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &GeometryStore {
        &self.scene
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn frame_index(&self) -> u32 {
        self.sequencer.frame_index()
    }
}
