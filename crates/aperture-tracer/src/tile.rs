use aperture_layout::{TileData, TileOutput, TILE_SIZE};
use bytemuck::Zeroable;
use glam::{Mat4, UVec2, Vec3, Vec4};

use crate::TilerError;

/// Upper bound on the tile accumulation buffer, mirroring the device-side
/// allocation budget.
pub const MAX_TILE_BUFFER_BYTES: usize = 64 << 20;

/// Per-tile lifecycle within a frame. Host-side bookkeeping only; the
/// cross-boundary record carries just the `needs_reset` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Idle,
    Tracing,
    Merged,
}

/// The output image partitioned into `TILE_SIZE` squares, one accumulation
/// record per tile. Records are created once per resolution and reset in
/// place; a resolution change rebuilds the whole grid.
pub struct TileGrid {
    resolution: UVec2,
    tiles_x: u32,
    tiles_y: u32,
    records: Vec<TileData>,
    states: Vec<TileState>,
}

impl TileGrid {
    pub fn new(resolution: UVec2) -> Result<Self, TilerError> {
        let tiles_x = resolution.x.div_ceil(TILE_SIZE);
        let tiles_y = resolution.y.div_ceil(TILE_SIZE);
        let tile_count = (tiles_x * tiles_y) as usize;

        let requested = tile_count * std::mem::size_of::<TileData>();
        if requested > MAX_TILE_BUFFER_BYTES {
            return Err(TilerError::ResourceExhaustion {
                requested,
                limit: MAX_TILE_BUFFER_BYTES,
            });
        }

        let mut records = vec![TileData::zeroed(); tile_count];
        for (i, record) in records.iter_mut().enumerate() {
            record.tile_index = i as u32;
            record.needs_reset = 1;
        }
        log::debug!("tile grid: {tiles_x}x{tiles_y} tiles for {resolution}");

        Ok(Self {
            resolution,
            tiles_x,
            tiles_y,
            records,
            states: vec![TileState::Idle; tile_count],
        })
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }

    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    pub fn tile_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[TileData] {
        &self.records
    }

    pub fn record(&self, tile_idx: u32) -> &TileData {
        &self.records[tile_idx as usize]
    }

    pub fn state(&self, tile_idx: u32) -> TileState {
        self.states[tile_idx as usize]
    }

    pub fn tile_containing(&self, pixel: UVec2) -> u32 {
        (pixel.y / TILE_SIZE) * self.tiles_x + pixel.x / TILE_SIZE
    }

    /// Pixel rectangle covered by a tile, exclusive max, clipped to the
    /// resolution on the bottom/right edges.
    pub fn pixel_rect(&self, tile_idx: u32) -> (UVec2, UVec2) {
        let tile_x = tile_idx % self.tiles_x;
        let tile_y = tile_idx / self.tiles_x;
        let min = UVec2::new(tile_x * TILE_SIZE, tile_y * TILE_SIZE);
        let max = (min + UVec2::splat(TILE_SIZE)).min(self.resolution);
        (min, max)
    }

    /// Recomputes every tile's world-space bounds by unprojecting its pixel
    /// rectangle through the current camera. Runs once per frame before
    /// dispatch so culling sees frame-consistent bounds.
    pub fn update_bounds(&mut self, inv_view_proj: &Mat4) {
        let resolution = self.resolution.as_vec2();
        for tile_idx in 0..self.records.len() as u32 {
            let (min, max) = self.pixel_rect(tile_idx);
            let mut world_min = Vec3::splat(f32::INFINITY);
            let mut world_max = Vec3::splat(f32::NEG_INFINITY);

            for corner in [
                min.as_vec2(),
                glam::Vec2::new(max.x as f32, min.y as f32),
                glam::Vec2::new(min.x as f32, max.y as f32),
                max.as_vec2(),
            ] {
                let ndc = (corner / resolution) * 2.0 - glam::Vec2::ONE;
                for depth in [0.0, 1.0] {
                    let world =
                        inv_view_proj.project_point3(Vec3::new(ndc.x, -ndc.y, depth));
                    world_min = world_min.min(world);
                    world_max = world_max.max(world);
                }
            }

            let record = &mut self.records[tile_idx as usize];
            record.min_bounds = world_min.to_array();
            record.max_bounds = world_max.to_array();
        }
    }

    /// Returns every tile to `Idle` with zeroed accumulation.
    pub fn reset_all(&mut self) {
        for record in &mut self.records {
            record.accumulated_color = [0.0; 4];
            record.sample_count = 0;
            record.needs_reset = 1;
        }
        self.states.fill(TileState::Idle);
    }

    pub(crate) fn begin_tracing(&mut self, tile_idx: u32) {
        self.states[tile_idx as usize] = TileState::Tracing;
    }

    /// Merges one frame's contribution into a tile. Sums only, never an
    /// incremental average, so merge order cannot matter.
    pub(crate) fn merge(&mut self, tile_idx: u32, output: &TileOutput) {
        let record = &mut self.records[tile_idx as usize];
        record.accumulated_color = (Vec4::from(record.accumulated_color)
            + Vec4::from(output.color))
        .to_array();
        record.sample_count += output.sample_count;
        record.needs_reset = 0;
        self.states[tile_idx as usize] = TileState::Merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_counts_round_up() {
        let grid = TileGrid::new(UVec2::new(1280, 720)).unwrap();
        assert_eq!(grid.tiles_x(), 80);
        assert_eq!(grid.tiles_y(), 45);
        assert_eq!(grid.tile_count(), 80 * 45);

        let grid = TileGrid::new(UVec2::new(33, 17)).unwrap();
        assert_eq!(grid.tiles_x(), 3);
        assert_eq!(grid.tiles_y(), 2);
    }

    #[test]
    fn fresh_grid_starts_idle_with_reset_flags() {
        let grid = TileGrid::new(UVec2::new(64, 64)).unwrap();
        for (i, record) in grid.records().iter().enumerate() {
            assert_eq!(record.tile_index, i as u32);
            assert_eq!(record.sample_count, 0);
            assert_eq!(record.needs_reset, 1);
            assert_eq!(grid.state(i as u32), TileState::Idle);
        }
    }

    #[test]
    fn edge_tiles_clip_to_the_resolution() {
        let grid = TileGrid::new(UVec2::new(33, 17)).unwrap();
        let (min, max) = grid.pixel_rect(2);
        assert_eq!(min, UVec2::new(32, 0));
        assert_eq!(max, UVec2::new(33, 16));

        let (min, max) = grid.pixel_rect(5);
        assert_eq!(min, UVec2::new(32, 16));
        assert_eq!(max, UVec2::new(33, 17));
    }

    #[test]
    fn merge_then_reset_restores_idle_zeroes() {
        let mut grid = TileGrid::new(UVec2::new(32, 32)).unwrap();
        let output = TileOutput {
            color: [2.0, 4.0, 6.0, 2.0],
            sample_count: 2,
            _padding0: [0; 3],
        };

        grid.begin_tracing(1);
        assert_eq!(grid.state(1), TileState::Tracing);
        grid.merge(1, &output);
        grid.merge(1, &output);

        let record = grid.record(1);
        assert_eq!(record.sample_count, 4);
        assert_eq!(record.accumulated_color, [4.0, 8.0, 12.0, 4.0]);
        assert_eq!(record.needs_reset, 0);
        assert_eq!(grid.state(1), TileState::Merged);

        grid.reset_all();
        let record = grid.record(1);
        assert_eq!(record.sample_count, 0);
        assert_eq!(record.accumulated_color, [0.0; 4]);
        assert_eq!(record.needs_reset, 1);
        assert_eq!(grid.state(1), TileState::Idle);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let result = TileGrid::new(UVec2::new(100_000, 100_000));
        assert!(matches!(
            result,
            Err(TilerError::ResourceExhaustion { .. })
        ));
    }

    #[test]
    fn tile_containing_matches_pixel_rects() {
        let grid = TileGrid::new(UVec2::new(64, 48)).unwrap();
        for pixel in [
            UVec2::new(0, 0),
            UVec2::new(15, 15),
            UVec2::new(16, 0),
            UVec2::new(63, 47),
        ] {
            let tile = grid.tile_containing(pixel);
            let (min, max) = grid.pixel_rect(tile);
            assert!(pixel.x >= min.x && pixel.x < max.x);
            assert!(pixel.y >= min.y && pixel.y < max.y);
        }
    }
}
