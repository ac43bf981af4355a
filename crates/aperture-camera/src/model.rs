use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

use crate::LensParams;

/// A world-space ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

pub struct CameraSample {
    /// Point on the film in NDC, jitter already applied.
    pub film_uv: Vec2,
    /// Point on the lens, already warped onto the unit disk.
    pub lens_uv: Vec2,
}

/// Per-frame ray generator: the camera's matrices and lens state frozen for
/// one dispatch. Rays are a pure function of the sample, so any invocation can
/// reproduce them independently.
pub struct LensCamera {
    inv_view: Mat4,
    inv_proj: Mat4,
    lens: LensParams,
}

impl LensCamera {
    pub fn new(inv_view: Mat4, inv_proj: Mat4, lens: LensParams) -> Self {
        Self {
            inv_view,
            inv_proj,
            lens,
        }
    }

    /// Generates the primary ray for a film sample.
    ///
    /// With a zero lens radius this is exactly the pinhole unproject; a finite
    /// radius offsets the origin on the lens disk and retargets through the
    /// focal plane. The aberration coefficients scale that lens offset
    /// anisotropically in the axis frame, so they only take effect on a
    /// finite aperture.
    pub fn generate_ray(&self, sample: &CameraSample) -> Ray {
        let corrected_uv = Vec2::new(sample.film_uv.x, -sample.film_uv.y);
        let target = self.inv_proj * Vec4::from((corrected_uv, 1.0, 1.0));
        let pinhole_dir = target.xyz().normalize();

        let (origin_cs, dir_cs) = if self.lens.radius > 0.0 {
            // Camera space looks down -z, so the focal plane sits at
            // z == -focal_distance.
            let focus = pinhole_dir * (self.lens.focal_distance / -pinhole_dir.z);
            let offset = self.aberrate(sample.lens_uv * self.lens.radius);
            let origin = Vec3::new(offset.x, offset.y, 0.0);
            (origin, (focus - origin).normalize())
        } else {
            (Vec3::ZERO, pinhole_dir)
        };

        Ray::new(
            self.inv_view.transform_point3(origin_cs),
            self.inv_view.transform_vector3(dir_cs).normalize(),
        )
    }

    /// Astigmatism-style lens imperfection: the transverse offset is rotated
    /// into the axis frame, stretched by the spherical coefficient on both
    /// axes and additionally by the cylindrical coefficient along the axis,
    /// then rotated back.
    fn aberrate(&self, offset: Vec2) -> Vec2 {
        if self.lens.spherical == 0.0 && self.lens.cylindrical == 0.0 {
            return offset;
        }

        let (sin, cos) = self.lens.axis.sin_cos();
        let local = Vec2::new(
            cos * offset.x + sin * offset.y,
            -sin * offset.x + cos * offset.y,
        );
        let scaled = Vec2::new(
            local.x * (1.0 + self.lens.spherical + self.lens.cylindrical),
            local.y * (1.0 + self.lens.spherical),
        );
        Vec2::new(
            cos * scaled.x - sin * scaled.y,
            sin * scaled.x + cos * scaled.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrices() -> (Mat4, Mat4) {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 3.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 300.0);
        (view.inverse(), proj.inverse())
    }

    fn pinhole_reference(inv_view: Mat4, inv_proj: Mat4, film_uv: Vec2) -> Ray {
        let corrected_uv = Vec2::new(film_uv.x, -film_uv.y);
        let origin = inv_view * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let target = inv_proj * Vec4::from((corrected_uv, 1.0, 1.0));
        let direction = inv_view * Vec4::from((target.xyz().normalize(), 0.0));
        Ray::new(origin.xyz(), direction.xyz().normalize())
    }

    #[test]
    fn zero_radius_matches_pinhole_exactly() {
        let (inv_view, inv_proj) = matrices();
        let camera = LensCamera::new(inv_view, inv_proj, LensParams::default());

        for film_uv in [
            Vec2::ZERO,
            Vec2::new(0.5, -0.25),
            Vec2::new(-0.99, 0.99),
            Vec2::new(0.125, 0.625),
        ] {
            let ray = camera.generate_ray(&CameraSample {
                film_uv,
                lens_uv: Vec2::new(0.7, -0.3),
            });
            let reference = pinhole_reference(inv_view, inv_proj, film_uv);
            assert_eq!(ray.origin, reference.origin);
            assert_eq!(ray.direction, reference.direction);
        }
    }

    #[test]
    fn ray_generation_is_deterministic() {
        let (inv_view, inv_proj) = matrices();
        let lens = LensParams {
            radius: 0.2,
            focal_distance: 3.0,
            spherical: 0.1,
            cylindrical: 0.05,
            axis: 0.4,
        };
        let camera = LensCamera::new(inv_view, inv_proj, lens);
        let sample = || CameraSample {
            film_uv: Vec2::new(0.3, 0.4),
            lens_uv: Vec2::new(-0.5, 0.2),
        };
        assert_eq!(
            camera.generate_ray(&sample()).direction,
            camera.generate_ray(&sample()).direction
        );
    }

    #[test]
    fn lens_rays_pass_through_the_focal_point() {
        // Identity view keeps camera space equal to world space.
        let inv_proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 300.0).inverse();
        let lens = LensParams {
            radius: 0.5,
            focal_distance: 4.0,
            ..LensParams::default()
        };
        let camera = LensCamera::new(Mat4::IDENTITY, inv_proj, lens);

        let film_uv = Vec2::new(0.2, -0.3);
        let pinhole = LensCamera::new(Mat4::IDENTITY, inv_proj, LensParams::default())
            .generate_ray(&CameraSample {
                film_uv,
                lens_uv: Vec2::ZERO,
            });
        let focus = pinhole.direction * (4.0 / -pinhole.direction.z);

        for lens_uv in [Vec2::new(0.9, 0.1), Vec2::new(-0.4, -0.6), Vec2::ZERO] {
            let ray = camera.generate_ray(&CameraSample { film_uv, lens_uv });
            let distance = (focus - ray.origin).cross(ray.direction).length();
            assert!(distance < 1e-4, "distance to focal point: {distance}");
        }
    }

    #[test]
    fn aberration_deviates_only_finite_apertures() {
        let (inv_view, inv_proj) = matrices();
        let aberrated = LensParams {
            radius: 0.0,
            spherical: 0.5,
            cylindrical: 0.25,
            axis: 1.0,
            ..LensParams::default()
        };
        let sample = CameraSample {
            film_uv: Vec2::new(0.1, 0.2),
            lens_uv: Vec2::new(0.5, 0.5),
        };

        let with = LensCamera::new(inv_view, inv_proj, aberrated).generate_ray(&sample);
        let without =
            LensCamera::new(inv_view, inv_proj, LensParams::default()).generate_ray(&sample);
        assert_eq!(with.direction, without.direction);

        // The same coefficients on an open aperture must bend the ray.
        let open = LensParams {
            radius: 0.3,
            ..aberrated
        };
        let plain = LensParams {
            radius: 0.3,
            ..LensParams::default()
        };
        let bent = LensCamera::new(inv_view, inv_proj, open).generate_ray(&sample);
        let straight = LensCamera::new(inv_view, inv_proj, plain).generate_ray(&sample);
        assert_ne!(bent.origin, straight.origin);
    }
}
