use aperture_layout::PackedTriangle;
use aperture_scene::MaterialKind;
use glam::{Vec2, Vec3};

use crate::intersect::Hit;
use crate::random::random_f32;
use crate::sampling::{safe_sqrt, sample_cosine_hemisphere, sqr, CoordSystem};

/// Refractive index used for every dielectric surface. The reflect/refract
/// split uses the Schlick approximation of the Fresnel term rather than a full
/// BRDF; see DESIGN.md.
const DIELECTRIC_IOR: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scatter {
    pub direction: Vec3,
    pub attenuation: Vec3,
}

fn reflect(incoming: Vec3, normal: Vec3) -> Vec3 {
    incoming - 2.0 * incoming.dot(normal) * normal
}

fn refract(incoming: Vec3, normal: Vec3, eta_ratio: f32, cos_theta: f32) -> Vec3 {
    let perpendicular = eta_ratio * (incoming + cos_theta * normal);
    let parallel = -safe_sqrt(1.0 - perpendicular.length_squared()) * normal;
    perpendicular + parallel
}

fn schlick_reflectance(cos_theta: f32, eta_ratio: f32) -> f32 {
    let r0 = sqr((1.0 - eta_ratio) / (1.0 + eta_ratio));
    r0 + (1.0 - r0) * (1.0 - cos_theta).powi(5)
}

/// Surface response at a hit point: the next ray direction and the throughput
/// attenuation it carries. `None` means the path is absorbed.
pub fn scatter(
    triangle: &PackedTriangle,
    incoming: Vec3,
    hit: &Hit,
    rng: &mut u32,
) -> Option<Scatter> {
    let albedo = triangle.color_rgb();

    match MaterialKind::from_tag(triangle.material) {
        Some(MaterialKind::Diffuse) | None => {
            let u = Vec2::new(random_f32(rng), random_f32(rng));
            let basis = CoordSystem::new(hit.normal);
            Some(Scatter {
                direction: basis.to_world(sample_cosine_hemisphere(u)),
                attenuation: albedo,
            })
        }
        Some(MaterialKind::SpecularMetal) => {
            let mirrored = reflect(incoming, hit.normal);
            let u = Vec2::new(random_f32(rng), random_f32(rng));
            let fuzz = CoordSystem::new(mirrored.normalize())
                .to_world(sample_cosine_hemisphere(u))
                * triangle.roughness;
            let direction = (mirrored + fuzz).normalize();

            // Roughness can push the lobe under the surface; absorb those.
            if direction.dot(hit.normal) <= 0.0 {
                return None;
            }
            Some(Scatter {
                direction,
                attenuation: albedo,
            })
        }
        Some(MaterialKind::Dielectric) => {
            let eta_ratio = if hit.front_face {
                1.0 / DIELECTRIC_IOR
            } else {
                DIELECTRIC_IOR
            };
            let cos_theta = (-incoming).dot(hit.normal).min(1.0);
            let sin_theta = safe_sqrt(1.0 - sqr(cos_theta));

            let total_internal = eta_ratio * sin_theta > 1.0;
            let direction =
                if total_internal || schlick_reflectance(cos_theta, eta_ratio) > random_f32(rng) {
                    reflect(incoming, hit.normal)
                } else {
                    refract(incoming, hit.normal, eta_ratio, cos_theta)
                };
            Some(Scatter {
                direction: direction.normalize(),
                attenuation: albedo,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_scene::Triangle;
    use glam::Vec3;

    fn hit_up() -> Hit {
        Hit {
            t: 1.0,
            triangle_idx: 0,
            position: Vec3::ZERO,
            normal: Vec3::Z,
            front_face: true,
        }
    }

    #[test]
    fn diffuse_scatters_into_the_upper_hemisphere() {
        let triangle = Triangle::diffuse(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            Vec3::new(0.8, 0.6, 0.4),
        )
        .pack();
        let mut rng = 7;

        for _ in 0..256 {
            let s = scatter(&triangle, Vec3::NEG_Z, &hit_up(), &mut rng).unwrap();
            assert!(s.direction.dot(Vec3::Z) >= 0.0);
            assert!((s.direction.length() - 1.0).abs() < 1e-4);
            assert_eq!(s.attenuation, Vec3::new(0.8, 0.6, 0.4));
        }
    }

    #[test]
    fn polished_metal_is_an_exact_mirror() {
        let triangle = Triangle::metal([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::ONE, 0.0).pack();
        let incoming = Vec3::new(1.0, 0.0, -1.0).normalize();
        let mut rng = 13;

        let s = scatter(&triangle, incoming, &hit_up(), &mut rng).unwrap();
        let expected = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!(s.direction.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn rough_metal_stays_above_the_surface_or_absorbs() {
        let triangle = Triangle::metal([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::ONE, 0.8).pack();
        let incoming = Vec3::new(1.0, 0.0, -0.05).normalize();
        let mut rng = 99;

        for _ in 0..256 {
            if let Some(s) = scatter(&triangle, incoming, &hit_up(), &mut rng) {
                assert!(s.direction.dot(Vec3::Z) > 0.0);
            }
        }
    }

    #[test]
    fn dielectric_always_produces_a_unit_direction() {
        let triangle = Triangle::dielectric([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::ONE).pack();
        let incoming = Vec3::new(0.6, 0.0, -0.8).normalize();
        let mut rng = 5;

        for _ in 0..256 {
            let s = scatter(&triangle, incoming, &hit_up(), &mut rng).unwrap();
            assert!((s.direction.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn grazing_dielectric_rays_mostly_reflect() {
        let triangle = Triangle::dielectric([Vec3::ZERO, Vec3::X, Vec3::Y], Vec3::ONE).pack();
        // Almost parallel to the surface: Schlick reflectance approaches one.
        let incoming = Vec3::new(0.999, 0.0, -0.04).normalize();
        let mut rng = 23;

        let mut reflected = 0;
        for _ in 0..256 {
            let s = scatter(&triangle, incoming, &hit_up(), &mut rng).unwrap();
            if s.direction.z > 0.0 {
                reflected += 1;
            }
        }
        assert!(reflected > 170, "only {reflected} of 256 reflected");
    }
}
