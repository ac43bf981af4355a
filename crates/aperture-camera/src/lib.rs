//! Camera state and primary-ray generation.
//!
//! The [`Camera`] is mutated only by host-side input handling and is treated
//! as read-only and frame-consistent during a dispatch; the frame sequencer
//! freezes it into a [`LensCamera`] once per frame.

use std::sync::Mutex;

use glam::Mat4;
use thiserror::Error;

mod frustum;
mod model;

pub use frustum::{Frustum, FrustumSide, Plane};
pub use model::{CameraSample, LensCamera, Ray};

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("lens radius {0} is negative")]
    InvalidLensRadius(f32),
    #[error("focal distance {0} is not positive")]
    InvalidFocalDistance(f32),
    #[error("aberration coefficient {0} is not finite")]
    NonFiniteCoefficient(f32),
}

/// Physical lens parameters applied on top of the pinhole projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensParams {
    /// Aperture radius in world units; zero is a perfect pinhole.
    pub radius: f32,
    /// Distance to the plane of perfect focus.
    pub focal_distance: f32,
    /// Spherical aberration coefficient, isotropic lens-offset stretch.
    pub spherical: f32,
    /// Cylindrical aberration coefficient, extra stretch along the axis.
    pub cylindrical: f32,
    /// Astigmatism axis angle in radians.
    pub axis: f32,
}

impl Default for LensParams {
    fn default() -> Self {
        Self {
            radius: 0.0,
            focal_distance: 1.0,
            spherical: 0.0,
            cylindrical: 0.0,
            axis: 0.0,
        }
    }
}

impl LensParams {
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.radius < 0.0 || !self.radius.is_finite() {
            return Err(CameraError::InvalidLensRadius(self.radius));
        }
        if self.focal_distance <= 0.0 || !self.focal_distance.is_finite() {
            return Err(CameraError::InvalidFocalDistance(self.focal_distance));
        }
        for coefficient in [self.spherical, self.cylindrical, self.axis] {
            if !coefficient.is_finite() {
                return Err(CameraError::NonFiniteCoefficient(coefficient));
            }
        }
        Ok(())
    }
}

/// Matrices frozen for one frame's dispatch.
pub struct CameraMatrices {
    pub view: Mat4,
    pub inv_view: Mat4,
    pub projection: Mat4,
    pub inv_projection: Mat4,
}

#[derive(Debug)]
pub struct Camera {
    view: Mat4,
    aspect_ratio: f32,
    fov: f32,
    near: f32,
    far: f32,
    lens: LensParams,
    matrix: Mutex<(Mat4, bool)>,
}

impl Clone for Camera {
    fn clone(&self) -> Self {
        let matrix = self.matrix.lock().unwrap();

        Self {
            view: self.view,
            aspect_ratio: self.aspect_ratio,
            fov: self.fov,
            near: self.near,
            far: self.far,
            lens: self.lens,
            matrix: Mutex::new(*matrix),
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            aspect_ratio: 1.0,
            fov: 60.0,
            near: 0.1,
            far: 300.0,
            lens: LensParams::default(),
            matrix: Mutex::new((Mat4::IDENTITY, true)),
        }
    }
}

impl Camera {
    pub fn new(view: Mat4, fov: f32, near: f32, far: f32, aspect_ratio: f32) -> Self {
        Self {
            view,
            aspect_ratio,
            fov,
            near,
            far,
            ..Default::default()
        }
    }

    /// View matrix, world to camera space.
    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
    }

    /// Vertical field of view in degrees.
    pub fn get_fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.matrix.lock().unwrap().1 = true;
    }

    /// Horizontal field of view in radians, derived from fov and aspect.
    pub fn fov_x(&self) -> f32 {
        2.0 * ((self.fov.to_radians() * 0.5).tan() * self.aspect_ratio).atan()
    }

    pub fn get_near(&self) -> f32 {
        self.near
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
        self.matrix.lock().unwrap().1 = true;
    }

    pub fn get_far(&self) -> f32 {
        self.far
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
        self.matrix.lock().unwrap().1 = true;
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.matrix.lock().unwrap().1 = true;
    }

    pub fn lens(&self) -> LensParams {
        self.lens
    }

    /// Applies a lens edit. Invalid parameters are rejected and the previous
    /// lens stays active, so a bad edit never disrupts rendering.
    pub fn set_lens(&mut self, lens: LensParams) -> Result<(), CameraError> {
        if let Err(err) = lens.validate() {
            log::warn!("rejected lens update: {err}");
            return Err(err);
        }
        self.lens = lens;
        Ok(())
    }

    pub fn get_matrix(&self) -> Mat4 {
        let mut matrix = self.matrix.lock().unwrap();

        if matrix.1 {
            matrix.0 = Mat4::perspective_rh(
                self.fov.to_radians(),
                self.aspect_ratio,
                self.near,
                self.far,
            );
            matrix.1 = false;
        }

        matrix.0
    }

    pub fn matrices(&self) -> CameraMatrices {
        let projection = self.get_matrix();
        CameraMatrices {
            view: self.view,
            inv_view: self.view.inverse(),
            projection,
            inv_projection: projection.inverse(),
        }
    }

    /// Ray generator for the current camera state.
    pub fn lens_camera(&self) -> LensCamera {
        let matrices = self.matrices();
        LensCamera::new(matrices.inv_view, matrices.inv_projection, self.lens)
    }

    pub fn frustum(&self) -> Frustum {
        let matrices = self.matrices();
        Frustum::new(&(matrices.projection * matrices.view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn invalid_lens_edits_keep_the_previous_lens() {
        let mut camera = Camera::default();
        let good = LensParams {
            radius: 0.25,
            focal_distance: 2.0,
            ..LensParams::default()
        };
        camera.set_lens(good).unwrap();

        assert_eq!(
            camera.set_lens(LensParams {
                radius: -0.1,
                ..good
            }),
            Err(CameraError::InvalidLensRadius(-0.1))
        );
        assert_eq!(
            camera.set_lens(LensParams {
                focal_distance: 0.0,
                ..good
            }),
            Err(CameraError::InvalidFocalDistance(0.0))
        );
        assert!(matches!(
            camera.set_lens(LensParams {
                spherical: f32::NAN,
                ..good
            }),
            Err(CameraError::NonFiniteCoefficient(_))
        ));

        assert_eq!(camera.lens(), good);
    }

    #[test]
    fn projection_cache_tracks_setters() {
        let mut camera = Camera::default();
        let initial = camera.get_matrix();
        camera.set_fov(90.0);
        assert_ne!(camera.get_matrix(), initial);
        assert_eq!(camera.get_matrix(), camera.get_matrix());
    }

    #[test]
    fn matrices_are_inverses() {
        let mut camera = Camera::default();
        camera.set_view(Mat4::look_at_rh(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y));
        let matrices = camera.matrices();
        let identity = matrices.view * matrices.inv_view;
        assert!(identity.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}
