use glam::{UVec2, Vec3};

use crate::tile::TileGrid;

const INV_GAMMA: f32 = 1.0 / 2.2;

/// Composites the merged tile records into a linear RGBA8 buffer, row-major
/// top-left origin. Tiles that have not merged a sample yet show the
/// background.
pub fn resolve_rgba8(grid: &TileGrid, background: Vec3) -> Vec<u8> {
    let resolution = grid.resolution();
    let mut pixels = Vec::with_capacity((resolution.x * resolution.y * 4) as usize);

    for y in 0..resolution.y {
        for x in 0..resolution.x {
            let record = grid.record(grid.tile_containing(UVec2::new(x, y)));
            let color = if record.sample_count == 0 {
                background
            } else {
                record.average()
            };

            for channel in [color.x, color.y, color.z] {
                let tonemapped = channel.clamp(0.0, 1.0).powf(INV_GAMMA);
                pixels.push((tonemapped * 255.0 + 0.5) as u8);
            }
            pixels.push(255);
        }
    }

    pixels
}
