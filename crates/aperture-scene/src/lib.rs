//! Immutable, frame-scoped triangle storage.
//!
//! The store owns the scene's triangles together with their packed upload
//! view. Loads replace the whole set or nothing: from the point of view of any
//! renderer frame there is never a partially-updated scene. Accumulation tasks
//! only ever see `&[PackedTriangle]`, so host-side synchronization reduces to
//! the borrow checker.

use aperture_layout::PackedTriangle;
use thiserror::Error;

mod triangle;
pub use triangle::{MaterialKind, Triangle};

/// Default triangle capacity, matching the device-side geometry buffer.
pub const DEFAULT_MAX_TRIANGLES: usize = 1 << 16;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene of {requested} triangles exceeds the configured capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
}

pub struct GeometryStore {
    triangles: Vec<Triangle>,
    packed: Vec<PackedTriangle>,
    capacity: usize,
    generation: u64,
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_TRIANGLES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::new(),
            packed: Vec::new(),
            capacity,
            generation: 0,
        }
    }

    /// Replaces the entire triangle set.
    ///
    /// An empty set is legal and renders background only. A set larger than
    /// the configured capacity is rejected and the previous set stays intact.
    pub fn load(&mut self, triangles: Vec<Triangle>) -> Result<(), SceneError> {
        if triangles.len() > self.capacity {
            return Err(SceneError::CapacityExceeded {
                requested: triangles.len(),
                capacity: self.capacity,
            });
        }

        self.packed = triangles.iter().map(Triangle::pack).collect();
        self.triangles = triangles;
        self.generation += 1;
        log::info!(
            "loaded scene generation {} with {} triangles",
            self.generation,
            self.triangles.len()
        );
        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bumped on every successful load; lets callers detect scene changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// The byte-exact view the accumulation kernel consumes.
    pub fn packed(&self) -> &[PackedTriangle] {
        &self.packed
    }
}
