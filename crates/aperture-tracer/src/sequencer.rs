use std::time::SystemTime;

use aperture_camera::Camera;
use aperture_layout::{ComputeParams, TileOutput};
use aperture_scene::GeometryStore;
use glam::{UVec2, Vec3};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::accumulator::{background_tile, trace_tile, AccumulatorConfig};
use crate::tile::TileGrid;

#[derive(Clone, Debug)]
pub struct Timer {
    start: SystemTime,
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            start: SystemTime::now(),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().unwrap_or_default().as_secs_f32()
    }

    pub fn reset(&mut self) {
        self.start = SystemTime::now();
    }
}

/// Host-observed change flags for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInputs {
    pub camera_changed: bool,
    pub geometry_changed: bool,
    pub reset_requested: bool,
}

impl FrameInputs {
    fn triggers_reset(&self) -> bool {
        self.camera_changed || self.geometry_changed || self.reset_requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame_index: u32,
    pub reset: bool,
    pub tiles_traced: u32,
    pub tiles_culled: u32,
    pub tiles_at_cap: u32,
    pub samples_merged: u64,
}

/// Advances the monotonic frame index, snapshots per-frame parameters,
/// applies the reset policy, dispatches one accumulation task per tile and
/// merges the results after the frame barrier.
pub struct FrameSequencer {
    frame_index: u32,
    timer: Timer,
    config: AccumulatorConfig,
}

struct TileJob {
    tile_idx: u32,
    rect: (UVec2, UVec2),
    culled: bool,
}

impl FrameSequencer {
    pub fn new(config: AccumulatorConfig) -> Self {
        Self {
            frame_index: 0,
            timer: Timer::new(),
            config,
        }
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// Immutable snapshot of everything an accumulation task reads this
    /// frame. Tasks only ever see this copy, never live camera or scene
    /// state.
    pub fn build_params(
        &self,
        scene: &GeometryStore,
        camera: &Camera,
        resolution: UVec2,
        frame_index: u32,
    ) -> ComputeParams {
        let matrices = camera.matrices();
        let lens = camera.lens();

        ComputeParams {
            time: self.timer.elapsed(),
            _padding0: 0.0,
            resolution: resolution.as_vec2().to_array(),
            frame_index,
            sample_count: self.config.max_samples_per_tile,
            _padding1: [0; 2],
            camera_position: matrices.inv_view.w_axis.truncate().to_array(),
            _padding2: 0.0,
            view_matrix: matrices.view.to_cols_array_2d(),
            inv_view_matrix: matrices.inv_view.to_cols_array_2d(),
            projection_matrix: matrices.projection.to_cols_array_2d(),
            fov_y: camera.get_fov().to_radians(),
            fov_x: camera.fov_x(),
            lens_radius: lens.radius,
            focal_distance: lens.focal_distance,
            aberration_sph: lens.spherical,
            aberration_cyl: lens.cylindrical,
            aberration_axis: lens.axis,
            active_triangle_count: scene.triangle_count() as u32,
        }
    }

    pub fn advance_frame(
        &mut self,
        scene: &GeometryStore,
        camera: &Camera,
        grid: &mut TileGrid,
        inputs: FrameInputs,
    ) -> FrameReport {
        self.frame_index += 1;
        let frame_index = self.frame_index;

        let reset = inputs.triggers_reset();
        if reset {
            log::debug!(
                "frame {frame_index}: reset (camera: {}, geometry: {}, explicit: {})",
                inputs.camera_changed,
                inputs.geometry_changed,
                inputs.reset_requested
            );
            grid.reset_all();
        }

        let params = self.build_params(scene, camera, grid.resolution(), frame_index);
        let matrices = camera.matrices();
        grid.update_bounds(&(matrices.projection * matrices.view).inverse());

        let frustum = camera.frustum();
        let lens_camera = camera.lens_camera();

        // Partition the frame's work: every tile is owned by exactly one job,
        // tiles already at the sample cap are left untouched.
        let mut jobs = Vec::with_capacity(grid.tile_count());
        let mut tiles_at_cap = 0u32;
        for tile_idx in 0..grid.tile_count() as u32 {
            let rect = grid.pixel_rect(tile_idx);
            let pixels = (rect.1 - rect.0).element_product();
            let record = grid.record(tile_idx);

            if record.sample_count >= self.config.max_samples_per_tile * pixels {
                tiles_at_cap += 1;
                continue;
            }

            let culled = !frustum.contains_aabb(
                Vec3::from(record.min_bounds),
                Vec3::from(record.max_bounds),
            );
            jobs.push(TileJob {
                tile_idx,
                rect,
                culled,
            });
            grid.begin_tracing(tile_idx);
        }

        let triangles = scene.packed();
        let config = &self.config;
        let run = |job: &TileJob| -> (u32, TileOutput) {
            let output = if job.culled {
                background_tile(job.rect, config)
            } else {
                trace_tile(job.rect, &params, &lens_camera, triangles, config)
            };
            (job.tile_idx, output)
        };

        let outputs: Vec<(u32, TileOutput)> = if self.config.parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

        // Frame barrier: every task above has completed before any merge
        // below runs, and the next frame cannot start until this call
        // returns the grid.
        let mut samples_merged = 0u64;
        let mut tiles_culled = 0u32;
        for (tile_idx, output) in &outputs {
            grid.merge(*tile_idx, output);
            samples_merged += output.sample_count as u64;
        }
        for job in &jobs {
            if job.culled {
                tiles_culled += 1;
            }
        }

        let report = FrameReport {
            frame_index,
            reset,
            tiles_traced: jobs.len() as u32 - tiles_culled,
            tiles_culled,
            tiles_at_cap,
            samples_merged,
        };
        log::debug!(
            "frame {frame_index}: {} traced, {} culled, {} at cap, {} samples merged",
            report.tiles_traced,
            report.tiles_culled,
            report.tiles_at_cap,
            report.samples_merged
        );
        report
    }
}
