use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane(Vec4);

impl Plane {
    pub fn new(x: Vec4) -> Self {
        Self(x)
    }

    /// Signed distance, positive on the inside of the frustum.
    pub fn distance(&self, p: Vec3) -> f32 {
        self.0.xyz().dot(p) + self.0.w
    }
}

impl From<Plane> for Vec4 {
    fn from(val: Plane) -> Self {
        val.0
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FrustumSide {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the six planes from a world-space view-projection matrix.
    pub fn new(view_projection: &Mat4) -> Self {
        let m = view_projection.transpose();

        let planes = [
            Plane::new(m.col(3) + m.col(0)),
            Plane::new(m.col(3) - m.col(0)),
            Plane::new(m.col(3) + m.col(1)),
            Plane::new(m.col(3) - m.col(1)),
            Plane::new(m.col(3) + m.col(2)),
            Plane::new(m.col(3) - m.col(2)),
        ];

        Self { planes }
    }

    pub fn get_plane(&self, side: FrustumSide) -> Plane {
        self.planes[side as usize]
    }

    /// Conservative AABB test: true unless the box is fully outside a plane.
    pub fn contains_aabb(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            let n = Vec4::from(*plane).xyz();
            let positive_vertex = Vec3::new(
                if n.x >= 0.0 { max.x } else { min.x },
                if n.y >= 0.0 { max.y } else { min.y },
                if n.z >= 0.0 { max.z } else { min.z },
            );
            if plane.distance(positive_vertex) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look_down_negative_z() -> Frustum {
        let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        Frustum::new(&(projection * view))
    }

    #[test]
    fn box_in_front_of_camera_is_inside() {
        let frustum = look_down_negative_z();
        assert!(frustum.contains_aabb(Vec3::new(-1.0, -1.0, -11.0), Vec3::new(1.0, 1.0, -9.0)));
    }

    #[test]
    fn box_behind_camera_is_outside() {
        let frustum = look_down_negative_z();
        assert!(!frustum.contains_aabb(Vec3::new(-1.0, -1.0, 9.0), Vec3::new(1.0, 1.0, 11.0)));
    }

    #[test]
    fn box_far_to_the_side_is_outside() {
        let frustum = look_down_negative_z();
        assert!(!frustum.contains_aabb(
            Vec3::new(500.0, -1.0, -11.0),
            Vec3::new(502.0, 1.0, -9.0)
        ));
    }

    #[test]
    fn box_straddling_a_plane_is_kept() {
        let frustum = look_down_negative_z();
        // Straddles the near plane; a conservative test must keep it.
        assert!(frustum.contains_aabb(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)));
    }
}
