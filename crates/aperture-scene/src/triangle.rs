use aperture_layout::{
    PackedTriangle, MATERIAL_DIELECTRIC, MATERIAL_DIFFUSE, MATERIAL_SPECULAR_METAL,
};
use glam::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Diffuse,
    SpecularMetal,
    Dielectric,
}

impl MaterialKind {
    pub fn tag(self) -> u32 {
        match self {
            MaterialKind::Diffuse => MATERIAL_DIFFUSE,
            MaterialKind::SpecularMetal => MATERIAL_SPECULAR_METAL,
            MaterialKind::Dielectric => MATERIAL_DIELECTRIC,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            MATERIAL_DIFFUSE => Some(MaterialKind::Diffuse),
            MATERIAL_SPECULAR_METAL => Some(MaterialKind::SpecularMetal),
            MATERIAL_DIELECTRIC => Some(MaterialKind::Dielectric),
            _ => None,
        }
    }
}

/// Host-side triangle description. Immutable once loaded into a
/// [`GeometryStore`](crate::GeometryStore); its index in the store is its
/// identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub color: Vec4,
    pub is_light: bool,
    pub intensity: f32,
    pub material: MaterialKind,
    pub roughness: f32,
}

impl Triangle {
    pub fn diffuse(positions: [Vec3; 3], color: Vec3) -> Self {
        Self {
            positions,
            color: color.extend(1.0),
            is_light: false,
            intensity: 0.0,
            material: MaterialKind::Diffuse,
            roughness: 1.0,
        }
    }

    pub fn metal(positions: [Vec3; 3], color: Vec3, roughness: f32) -> Self {
        Self {
            positions,
            color: color.extend(1.0),
            is_light: false,
            intensity: 0.0,
            material: MaterialKind::SpecularMetal,
            roughness,
        }
    }

    pub fn dielectric(positions: [Vec3; 3], color: Vec3) -> Self {
        Self {
            positions,
            color: color.extend(1.0),
            is_light: false,
            intensity: 0.0,
            material: MaterialKind::Dielectric,
            roughness: 0.0,
        }
    }

    pub fn light(positions: [Vec3; 3], color: Vec3, intensity: f32) -> Self {
        Self {
            positions,
            color: color.extend(1.0),
            is_light: true,
            intensity,
            material: MaterialKind::Diffuse,
            roughness: 1.0,
        }
    }

    /// Geometric normal, right-handed winding.
    pub fn normal(&self) -> Vec3 {
        let e1 = self.positions[1] - self.positions[0];
        let e2 = self.positions[2] - self.positions[0];
        e1.cross(e2).normalize()
    }

    pub fn pack(&self) -> PackedTriangle {
        PackedTriangle {
            p0: self.positions[0].to_array(),
            _padding0: 0.0,
            p1: self.positions[1].to_array(),
            _padding1: 0.0,
            p2: self.positions[2].to_array(),
            _padding2: 0.0,
            color: self.color.to_array(),
            is_light: self.is_light as u32,
            intensity: self.intensity,
            material: self.material.tag(),
            roughness: self.roughness,
        }
    }
}
