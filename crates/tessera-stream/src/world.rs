//! Collaborator seams used by the streamer, plus a concurrent reference world.
//!
//! The streamer never owns world state. It asks a [`ChunkWorld`] where the
//! viewpoint is and what is already resident, and it hands empty chunks to a
//! [`ChunkGenerator`] to fill. [`ResidentWorld`] is a ready-made
//! [`ChunkWorld`] backed by a [`DashMap`], used by the demo and the tests.

use dashmap::DashMap;
use glam::{UVec3, Vec3};
use parking_lot::RwLock;

use crate::bounds::ChunkBounds;
use crate::chunk::Chunk;
use crate::coord::ChunkCoord;
use crate::error::GenerateError;
use crate::handoff::LoadedChunk;

/// The world manager as seen by the streaming worker.
///
/// Called from the worker thread, concurrently with the consumer mutating
/// the world, so implementations must be internally synchronized.
pub trait ChunkWorld: Send + Sync {
    /// Chunk the viewpoint is currently in.
    fn center(&self) -> ChunkCoord;

    /// Returns `true` if a chunk at `coord` is already live in the world.
    fn is_resident(&self, coord: ChunkCoord) -> bool;

    /// World-space bounds of the chunk at `coord`.
    fn chunk_bounds(&self, coord: ChunkCoord) -> ChunkBounds;

    /// Post-load hook run on the worker after generation succeeds.
    fn on_chunk_loaded(&self, chunk: &mut Chunk) {
        chunk.recalculate_state();
    }
}

/// Fills an empty chunk with content.
///
/// Runs synchronously on the streaming worker.
pub trait ChunkGenerator: Send + Sync {
    /// Generates voxels into `chunk`, which arrives all air.
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError>;
}

impl<F> ChunkGenerator for F
where
    F: Fn(&mut Chunk) -> Result<(), GenerateError> + Send + Sync,
{
    fn generate(&self, chunk: &mut Chunk) -> Result<(), GenerateError> {
        self(chunk)
    }
}

/// Concurrent map of resident chunks with a movable center.
pub struct ResidentWorld {
    chunks: DashMap<ChunkCoord, Chunk>,
    center: RwLock<ChunkCoord>,
    chunk_size: UVec3,
    voxel_size: Vec3,
}

impl ResidentWorld {
    /// Creates an empty world centered on the origin chunk.
    pub fn new(chunk_size: UVec3, voxel_size: Vec3) -> Self {
        Self {
            chunks: DashMap::new(),
            center: RwLock::new(ChunkCoord::default()),
            chunk_size,
            voxel_size,
        }
    }

    /// Moves the viewpoint. Returns `true` if the center chunk changed.
    pub fn set_center(&self, center: ChunkCoord) -> bool {
        let mut current = self.center.write();
        let changed = *current != center;
        *current = center;
        changed
    }

    /// Makes a produced chunk live.
    ///
    /// Returns the chunk previously resident at that coordinate, if any, so
    /// the caller can release its slot.
    pub fn integrate(&self, loaded: LoadedChunk) -> Option<Chunk> {
        self.chunks.insert(loaded.coord, loaded.chunk)
    }

    /// Removes the chunk at `coord` from the world.
    pub fn retire(&self, coord: ChunkCoord) -> Option<Chunk> {
        self.chunks.remove(&coord).map(|(_, chunk)| chunk)
    }

    /// Removes every chunk outside the half-open window around `center`.
    pub fn retire_outside(&self, center: ChunkCoord, distance: UVec3) -> Vec<Chunk> {
        let doomed: Vec<ChunkCoord> = self
            .chunks
            .iter()
            .map(|entry| *entry.key())
            .filter(|coord| !coord.in_window(&center, distance))
            .collect();
        doomed
            .into_iter()
            .filter_map(|coord| self.retire(coord))
            .collect()
    }

    /// Runs `f` on the resident chunk at `coord`.
    pub fn with_chunk<R>(&self, coord: ChunkCoord, f: impl FnOnce(&Chunk) -> R) -> Option<R> {
        self.chunks.get(&coord).map(|entry| f(entry.value()))
    }

    /// Returns `true` if a chunk is resident at `coord`.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of resident chunks.
    pub fn resident_count(&self) -> usize {
        self.chunks.len()
    }
}

impl ChunkWorld for ResidentWorld {
    fn center(&self) -> ChunkCoord {
        *self.center.read()
    }

    fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.contains(coord)
    }

    fn chunk_bounds(&self, coord: ChunkCoord) -> ChunkBounds {
        ChunkBounds::for_chunk(coord, self.chunk_size, self.voxel_size)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
