use aperture_camera::{CameraSample, LensCamera};
use aperture_layout::{ComputeParams, PackedTriangle, TileOutput, MAX_SAMPLES_PER_TILE};
use bytemuck::Zeroable;
use glam::{UVec2, Vec2, Vec3, Vec4};

use crate::integrator::{trace_radiance, BACKGROUND_COLOR, MAX_BOUNCES};
use crate::random::{pixel_seed, random_f32};
use crate::sampling::sample_uniform_disk_concentric;

#[derive(Debug, Clone, Copy)]
pub struct AccumulatorConfig {
    /// Samples traced per pixel per frame.
    pub samples_per_frame: u32,
    /// Additional bounces after the primary hit.
    pub max_bounces: u32,
    /// Radiance for rays that leave the scene.
    pub background: Vec3,
    /// Per-pixel sample cap; tiles at the cap are skipped, not reset.
    pub max_samples_per_tile: u32,
    /// Dispatch tiles across the rayon pool. Sequential dispatch exists for
    /// reproducibility checks and must produce bit-identical tiles.
    pub parallel: bool,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            samples_per_frame: 4,
            max_bounces: MAX_BOUNCES,
            background: BACKGROUND_COLOR,
            max_samples_per_tile: MAX_SAMPLES_PER_TILE,
            parallel: true,
        }
    }
}

/// Traces every sample a tile owns for this frame and sums them into a
/// [`TileOutput`].
///
/// The traversal order over pixels and samples is fixed, and each sample's
/// RNG stream depends only on (pixel, frame, sample), so the produced output
/// is a pure function of its inputs regardless of which worker runs it or
/// when it completes.
pub(crate) fn trace_tile(
    rect: (UVec2, UVec2),
    params: &ComputeParams,
    camera: &LensCamera,
    triangles: &[PackedTriangle],
    config: &AccumulatorConfig,
) -> TileOutput {
    let resolution = Vec2::from(params.resolution);
    let mut sum = Vec3::ZERO;
    let mut sample_count = 0u32;

    for y in rect.0.y..rect.1.y {
        for x in rect.0.x..rect.1.x {
            let pixel = UVec2::new(x, y);
            for sample in 0..config.samples_per_frame {
                let mut rng = pixel_seed(pixel, params.frame_index, sample);

                let jitter = Vec2::new(random_f32(&mut rng), random_f32(&mut rng));
                let film_uv = ((pixel.as_vec2() + jitter) / resolution) * 2.0 - Vec2::ONE;
                let lens_uv = sample_uniform_disk_concentric(Vec2::new(
                    random_f32(&mut rng),
                    random_f32(&mut rng),
                ));

                let ray = camera.generate_ray(&CameraSample { film_uv, lens_uv });
                sum += trace_radiance(
                    ray,
                    &triangles[..params.active_triangle_count as usize],
                    config.background,
                    config.max_bounces,
                    &mut rng,
                );
                sample_count += 1;
            }
        }
    }

    TileOutput {
        color: sum.extend(sample_count as f32).to_array(),
        sample_count,
        _padding0: [0; 3],
    }
}

/// Contribution for a tile whose bounds fell outside the frustum: tracing is
/// skipped, but the tile still advances by the same sample count as its
/// neighbours so convergence reporting stays uniform across the grid.
pub(crate) fn background_tile(rect: (UVec2, UVec2), config: &AccumulatorConfig) -> TileOutput {
    let pixels = (rect.1 - rect.0).element_product();
    let sample_count = pixels * config.samples_per_frame;

    let sum = config.background * sample_count as f32;
    let mut output = TileOutput::zeroed();
    output.color = Vec4::from((sum, sample_count as f32)).to_array();
    output.sample_count = sample_count;
    output
}
