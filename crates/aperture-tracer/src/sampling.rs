use core::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::{Vec2, Vec3};

pub fn sqr<T: core::ops::Mul<Output = T> + Copy>(x: T) -> T {
    x * x
}

pub fn safe_sqrt(x: f32) -> f32 {
    x.max(0.0).sqrt()
}

pub fn sample_uniform_disk_concentric(u: Vec2) -> Vec2 {
    let u_offset = 2.0 * u - Vec2::ONE;
    if u_offset == Vec2::ZERO {
        u_offset
    } else {
        let (theta, r) = if u_offset.x.abs() > u_offset.y.abs() {
            (FRAC_PI_4 * (u_offset.y / u_offset.x), u_offset.x)
        } else {
            (
                FRAC_PI_2 - FRAC_PI_4 * (u_offset.x / u_offset.y),
                u_offset.y,
            )
        };

        Vec2::new(theta.cos(), theta.sin()) * r
    }
}

pub fn sample_cosine_hemisphere(u: Vec2) -> Vec3 {
    let d = sample_uniform_disk_concentric(u);
    let z = safe_sqrt(1.0 - sqr(d.x) - sqr(d.y));
    Vec3::new(d.x, d.y, z)
}

/// Branchless orthonormal basis around a forward vector.
pub struct CoordSystem {
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

impl CoordSystem {
    pub fn new(forward: Vec3) -> Self {
        let sign = forward.z.signum();
        let a = -1.0 / (sign + forward.z);
        let b = forward.x * forward.y * a;

        let up = Vec3::new(1.0 + sign * sqr(forward.x) * a, sign * b, -sign * forward.x);
        let right = Vec3::new(b, sign + sqr(forward.y) * a, -forward.y);

        Self { right, up, forward }
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Maps a z-up local direction into this basis.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.up * local.x + self.right * local.y + self.forward * local.z
    }
}
