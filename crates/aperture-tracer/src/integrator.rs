use aperture_camera::Ray;
use aperture_layout::PackedTriangle;
use glam::Vec3;

use crate::intersect::closest_hit;
use crate::material::scatter;

/// Additional bounces traced after the primary hit.
pub const MAX_BOUNCES: u32 = 3;

/// Radiance reported by rays that leave the scene. Misses carry full sample
/// weight so the per-tile sample count stays a uniform denominator.
pub const BACKGROUND_COLOR: Vec3 = Vec3::new(0.05, 0.07, 0.10);

const PATH_OFFSET: f32 = 1e-3;
const MIN_THROUGHPUT: f32 = 1e-4;

/// Radiance arriving along a single camera ray.
///
/// The bounce recursion is expressed as an explicit loop: one primary segment
/// plus up to `max_bounces` scattered segments, each attenuating the path
/// throughput by the surface response. Paths end at a light source, at the
/// background, or by absorption.
pub fn trace_radiance(
    mut ray: Ray,
    triangles: &[PackedTriangle],
    background: Vec3,
    max_bounces: u32,
    rng: &mut u32,
) -> Vec3 {
    let mut radiance = Vec3::ZERO;
    let mut throughput = Vec3::ONE;

    for _ in 0..=max_bounces {
        let Some(hit) = closest_hit(&ray, triangles) else {
            radiance += throughput * background;
            break;
        };

        let triangle = &triangles[hit.triangle_idx as usize];
        if triangle.is_light != 0 {
            radiance += throughput * triangle.color_rgb() * triangle.intensity;
            break;
        }

        let Some(next) = scatter(triangle, ray.direction, &hit, rng) else {
            break;
        };
        throughput *= next.attenuation;
        if throughput.max_element() < MIN_THROUGHPUT {
            break;
        }
        ray = Ray::new(hit.position + next.direction * PATH_OFFSET, next.direction);
    }

    radiance
}
