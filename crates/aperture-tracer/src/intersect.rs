use aperture_camera::Ray;
use aperture_layout::PackedTriangle;
use glam::Vec3;

/// Hits closer than this are rejected to keep secondary rays from re-hitting
/// the surface they left.
pub const HIT_EPSILON: f32 = 1e-4;

const DEGENERATE_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    pub triangle_idx: u32,
    pub position: Vec3,
    /// Geometric normal, flipped to face the incoming ray.
    pub normal: Vec3,
    /// True when the ray arrived on the winding-order front side.
    pub front_face: bool,
}

/// Möller-Trumbore intersection, returning only the distance.
fn intersect_triangle(ray: &Ray, triangle: &PackedTriangle) -> Option<f32> {
    let p0 = triangle.position(0);
    let edge1 = triangle.position(1) - p0;
    let edge2 = triangle.position(2) - p0;

    let pvec = ray.direction.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < DEGENERATE_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray.origin - p0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray.direction.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t <= HIT_EPSILON {
        return None;
    }
    Some(t)
}

/// Nearest intersection along the ray.
///
/// Triangles are visited in ascending index order and a strictly-closer hit is
/// required to replace the current best, so equal distances resolve to the
/// lowest triangle index deterministically.
pub fn closest_hit(ray: &Ray, triangles: &[PackedTriangle]) -> Option<Hit> {
    let mut best: Option<(f32, u32)> = None;

    for (idx, triangle) in triangles.iter().enumerate() {
        if let Some(t) = intersect_triangle(ray, triangle) {
            if best.map_or(true, |(best_t, _)| t < best_t) {
                best = Some((t, idx as u32));
            }
        }
    }

    best.map(|(t, triangle_idx)| {
        let triangle = &triangles[triangle_idx as usize];
        let p0 = triangle.position(0);
        let geometric_normal = (triangle.position(1) - p0)
            .cross(triangle.position(2) - p0)
            .normalize();
        let front_face = ray.direction.dot(geometric_normal) < 0.0;
        Hit {
            t,
            triangle_idx,
            position: ray.at(t),
            normal: if front_face {
                geometric_normal
            } else {
                -geometric_normal
            },
            front_face,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_scene::Triangle;

    fn quad_at_z(z: f32) -> PackedTriangle {
        Triangle::diffuse(
            [
                Vec3::new(-10.0, -10.0, z),
                Vec3::new(10.0, -10.0, z),
                Vec3::new(0.0, 10.0, z),
            ],
            Vec3::ONE,
        )
        .pack()
    }

    #[test]
    fn nearest_triangle_wins() {
        let triangles = [quad_at_z(-5.0), quad_at_z(-2.0), quad_at_z(-8.0)];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hit = closest_hit(&ray, &triangles).unwrap();
        assert_eq!(hit.triangle_idx, 1);
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!(hit.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn ties_break_to_the_lowest_index() {
        let triangles = [quad_at_z(-3.0), quad_at_z(-3.0), quad_at_z(-3.0)];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        let hit = closest_hit(&ray, &triangles).unwrap();
        assert_eq!(hit.triangle_idx, 0);
    }

    #[test]
    fn repeated_queries_are_identical() {
        let triangles = [quad_at_z(-5.0), quad_at_z(-2.5)];
        let ray = Ray::new(Vec3::new(0.1, -0.2, 0.0), Vec3::NEG_Z);

        let first = closest_hit(&ray, &triangles).unwrap();
        for _ in 0..100 {
            assert_eq!(closest_hit(&ray, &triangles).unwrap(), first);
        }
    }

    #[test]
    fn miss_returns_none() {
        let triangles = [quad_at_z(-5.0)];
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(closest_hit(&ray, &triangles), None);

        assert_eq!(closest_hit(&ray, &[]), None);
    }

    #[test]
    fn normal_faces_the_ray() {
        let triangles = [quad_at_z(-3.0)];

        let from_front = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = closest_hit(&from_front, &triangles).unwrap();
        assert!(hit.normal.dot(from_front.direction) < 0.0);
        assert!(hit.front_face);

        let from_behind = Ray::new(Vec3::new(0.0, 0.0, -6.0), Vec3::Z);
        let hit = closest_hit(&from_behind, &triangles).unwrap();
        assert!(hit.normal.dot(from_behind.direction) < 0.0);
        assert!(!hit.front_face);
    }

    #[test]
    fn hits_behind_the_origin_are_rejected() {
        let triangles = [quad_at_z(2.0)];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(closest_hit(&ray, &triangles), None);
    }
}
