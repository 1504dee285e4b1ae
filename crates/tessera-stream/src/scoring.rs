//! Pluggable priority scoring for pending chunks.
//!
//! The worker always computes the biased squared distance first; a
//! [`PriorityScorer`] may then adjust it. Lower scores load first.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bounds::{Frustum, Intersection};
use crate::coord::ChunkCoord;
use crate::world::ChunkWorld;

/// Default factor by which [`FrustumPriority`] shrinks visible chunks' scores.
pub const DEFAULT_FRUSTUM_DISCOUNT: f64 = 100.0;

/// Adjusts the scheduling score of a pending chunk.
pub trait PriorityScorer: Send + Sync {
    /// Returns the score for `coord`, given its biased squared distance.
    fn score(&self, coord: ChunkCoord, distance_sq: i64, world: &dyn ChunkWorld) -> f64;
}

/// Pure nearest-first ordering.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestFirst;

impl PriorityScorer for NearestFirst {
    fn score(&self, _coord: ChunkCoord, distance_sq: i64, _world: &dyn ChunkWorld) -> f64 {
        distance_sq as f64
    }
}

/// Handle through which the consumer keeps the scorer's frustum current.
pub type SharedFrustum = Arc<RwLock<Frustum>>;

/// Discounts chunks whose bounds touch the view frustum so they load before
/// equally distant chunks out of view.
pub struct FrustumPriority {
    frustum: SharedFrustum,
    discount: f64,
}

impl FrustumPriority {
    /// Creates a scorer reading `frustum`, using [`DEFAULT_FRUSTUM_DISCOUNT`].
    pub fn new(frustum: SharedFrustum) -> Self {
        Self::with_discount(frustum, DEFAULT_FRUSTUM_DISCOUNT)
    }

    /// Creates a scorer dividing visible chunks' scores by `discount`.
    pub fn with_discount(frustum: SharedFrustum, discount: f64) -> Self {
        Self {
            frustum,
            discount: discount.max(1.0),
        }
    }
}

impl PriorityScorer for FrustumPriority {
    fn score(&self, coord: ChunkCoord, distance_sq: i64, world: &dyn ChunkWorld) -> f64 {
        let bounds = world.chunk_bounds(coord);
        let base = distance_sq as f64;
        match self.frustum.read().intersects(&bounds) {
            Intersection::Outside => base,
            Intersection::Inside | Intersection::Intersecting => base / self.discount,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
