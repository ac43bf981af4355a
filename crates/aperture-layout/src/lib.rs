//! Types and constants shared between the host renderer and the tile
//! accumulation kernels.
//!
//! Every record in this crate crosses the host/device buffer boundary, so each
//! one has a fixed `#[repr(C)]` layout with explicit padding fields and a
//! 16-byte-aligned stride. Field order must match the device-side declarations
//! exactly; the const assertions at the bottom of this file make a drifted
//! layout a compile error, and [`verify_layout`] re-checks the same table at
//! startup so a mismatch is reported instead of corrupting every record after
//! the first.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use thiserror::Error;

/// Edge length of a square tile in pixels.
pub const TILE_SIZE: u32 = 16;
/// Dispatch-sizing hint for per-tile triangle lists, not a hard scene limit.
pub const MAX_TRIANGLES_IN_TILE: u32 = 32;
/// Dispatch-sizing hint for per-tile quad lists.
pub const MAX_QUADS_IN_TILE: u32 = 32;
/// A tile stops accumulating once it has merged this many samples per pixel.
pub const MAX_SAMPLES_PER_TILE: u32 = 64;

/// Material tags stored in [`PackedTriangle::material`].
pub const MATERIAL_DIFFUSE: u32 = 0;
pub const MATERIAL_SPECULAR_METAL: u32 = 1;
pub const MATERIAL_DIELECTRIC: u32 = 2;

/// One triangle as the accumulation kernel reads it. 80 bytes.
///
/// Positions carry a trailing padding float each so that every field sits on
/// the same offsets the device-side struct uses. The triangle's index in the
/// geometry buffer is its identity; there is no separate id field.
#[derive(Pod, Clone, Copy, Zeroable, PartialEq, Debug)]
#[repr(C)]
pub struct PackedTriangle {
    pub p0: [f32; 3],
    pub _padding0: f32,
    pub p1: [f32; 3],
    pub _padding1: f32,
    pub p2: [f32; 3],
    pub _padding2: f32,
    pub color: [f32; 4],
    pub is_light: u32,
    pub intensity: f32,
    pub material: u32,
    pub roughness: f32,
}

impl PackedTriangle {
    pub fn position(&self, i: usize) -> Vec3 {
        match i {
            0 => Vec3::from(self.p0),
            1 => Vec3::from(self.p1),
            _ => Vec3::from(self.p2),
        }
    }

    pub fn color_rgb(&self) -> Vec3 {
        Vec4::from(self.color).truncate()
    }
}

/// Per-tile accumulation record. 80 bytes.
///
/// `accumulated_color` is a running sum, never an average, so merges stay
/// exact and commutative; the display pass divides by `sample_count`.
#[derive(Pod, Clone, Copy, Zeroable, PartialEq, Debug)]
#[repr(C)]
pub struct TileData {
    pub accumulated_color: [f32; 4],
    pub sample_count: u32,
    pub _padding0: [u32; 3],
    pub min_bounds: [f32; 3],
    pub _padding1: f32,
    pub max_bounds: [f32; 3],
    pub _padding2: f32,
    pub tile_index: u32,
    pub needs_reset: u32,
    pub _padding3: [u32; 2],
}

impl TileData {
    /// Current converged estimate, or zero while no samples have merged.
    pub fn average(&self) -> Vec3 {
        if self.sample_count == 0 {
            Vec3::ZERO
        } else {
            Vec4::from(self.accumulated_color).truncate() / self.sample_count as f32
        }
    }
}

/// One tile's contribution for a single frame, produced by an accumulation
/// task and merged by the frame sequencer. 32 bytes.
#[derive(Pod, Clone, Copy, Zeroable, PartialEq, Debug)]
#[repr(C)]
pub struct TileOutput {
    pub color: [f32; 4],
    pub sample_count: u32,
    pub _padding0: [u32; 3],
}

/// Immutable per-frame snapshot handed to every accumulation task. 272 bytes.
#[derive(Pod, Clone, Copy, Zeroable, PartialEq, Debug)]
#[repr(C)]
pub struct ComputeParams {
    pub time: f32,
    pub _padding0: f32,
    pub resolution: [f32; 2],
    pub frame_index: u32,
    pub sample_count: u32,
    pub _padding1: [u32; 2],
    pub camera_position: [f32; 3],
    pub _padding2: f32,
    pub view_matrix: [[f32; 4]; 4],
    pub inv_view_matrix: [[f32; 4]; 4],
    pub projection_matrix: [[f32; 4]; 4],
    pub fov_y: f32,
    pub fov_x: f32,
    pub lens_radius: f32,
    pub focal_distance: f32,
    pub aberration_sph: f32,
    pub aberration_cyl: f32,
    pub aberration_axis: f32,
    pub active_triangle_count: u32,
}

impl ComputeParams {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_matrix)
    }

    pub fn inv_view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inv_view_matrix)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection_matrix)
    }
}

pub const PACKED_TRIANGLE_STRIDE: usize = 80;
pub const TILE_DATA_STRIDE: usize = 80;
pub const TILE_OUTPUT_STRIDE: usize = 32;
pub const COMPUTE_PARAMS_STRIDE: usize = 272;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{record} is {actual} bytes on the host, device layout expects {expected}")]
    Mismatch {
        record: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{record} stride of {stride} bytes is not 16-byte aligned")]
    Misaligned { record: &'static str, stride: usize },
}

fn check_stride(
    record: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), LayoutError> {
    if actual != expected {
        return Err(LayoutError::Mismatch {
            record,
            expected,
            actual,
        });
    }
    if expected % 16 != 0 {
        return Err(LayoutError::Misaligned {
            record,
            stride: expected,
        });
    }
    Ok(())
}

/// Startup check that the host structs still match the device-side strides.
///
/// The const assertions below already reject most drift at compile time; this
/// exists so renderer construction can fail with a diagnosable report instead
/// of trusting whatever binary it was linked against.
pub fn verify_layout() -> Result<(), LayoutError> {
    use std::mem::size_of;

    check_stride(
        "PackedTriangle",
        PACKED_TRIANGLE_STRIDE,
        size_of::<PackedTriangle>(),
    )?;
    check_stride("TileData", TILE_DATA_STRIDE, size_of::<TileData>())?;
    check_stride("TileOutput", TILE_OUTPUT_STRIDE, size_of::<TileOutput>())?;
    check_stride(
        "ComputeParams",
        COMPUTE_PARAMS_STRIDE,
        size_of::<ComputeParams>(),
    )?;
    Ok(())
}

const _: () = {
    use std::mem::{offset_of, size_of};

    assert!(size_of::<PackedTriangle>() == PACKED_TRIANGLE_STRIDE);
    assert!(offset_of!(PackedTriangle, p1) == 16);
    assert!(offset_of!(PackedTriangle, p2) == 32);
    assert!(offset_of!(PackedTriangle, color) == 48);
    assert!(offset_of!(PackedTriangle, is_light) == 64);
    assert!(offset_of!(PackedTriangle, roughness) == 76);

    assert!(size_of::<TileData>() == TILE_DATA_STRIDE);
    assert!(offset_of!(TileData, sample_count) == 16);
    assert!(offset_of!(TileData, min_bounds) == 32);
    assert!(offset_of!(TileData, max_bounds) == 48);
    assert!(offset_of!(TileData, tile_index) == 64);
    assert!(offset_of!(TileData, needs_reset) == 68);

    assert!(size_of::<TileOutput>() == TILE_OUTPUT_STRIDE);
    assert!(offset_of!(TileOutput, sample_count) == 16);

    assert!(size_of::<ComputeParams>() == COMPUTE_PARAMS_STRIDE);
    assert!(offset_of!(ComputeParams, resolution) == 8);
    assert!(offset_of!(ComputeParams, frame_index) == 16);
    assert!(offset_of!(ComputeParams, camera_position) == 32);
    assert!(offset_of!(ComputeParams, view_matrix) == 48);
    assert!(offset_of!(ComputeParams, inv_view_matrix) == 112);
    assert!(offset_of!(ComputeParams, projection_matrix) == 176);
    assert!(offset_of!(ComputeParams, fov_y) == 240);
    assert!(offset_of!(ComputeParams, active_triangle_count) == 268);
};
