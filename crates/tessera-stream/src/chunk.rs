//! Chunks constructed in place inside leased pool slots.
//!
//! A [`Chunk`] borrows nothing: it owns the [`PoolSlot`] its voxels live in,
//! and hands the slot back via [`Chunk::into_slot`] when the world retires it.

use glam::{UVec3, Vec3};

use crate::coord::ChunkCoord;
use crate::pool::PoolSlot;

/// Voxel material identifier. `0` is air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelId(pub u16);

impl VoxelId {
    /// Empty space.
    pub const AIR: VoxelId = VoxelId(0);

    /// Returns `true` for anything other than air.
    pub fn is_solid(self) -> bool {
        self != Self::AIR
    }
}

/// Load state of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Constructed and being filled by a generator.
    Loading,
    /// Generated and ready for the world.
    Loaded,
    /// The generator gave up; the chunk is discarded.
    Failed,
}

/// A fixed-size block of voxels at one chunk coordinate.
#[derive(Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    size: UVec3,
    voxel_size: Vec3,
    status: ChunkStatus,
    slot: PoolSlot,
    solid_count: usize,
    version: u64,
}

impl Chunk {
    /// Constructs an empty (all air) chunk inside `slot`.
    ///
    /// The streamer checks slot size once at start-up.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds fewer than `size.x * size.y * size.z` voxels.
    pub fn new_in(slot: PoolSlot, coord: ChunkCoord, size: UVec3, voxel_size: Vec3) -> Self {
        let volume = Self::volume_of(size);
        assert!(
            slot.len() >= volume,
            "pool slot too small for chunk: {} < {volume}",
            slot.len()
        );
        let mut chunk = Self {
            coord,
            size,
            voxel_size,
            status: ChunkStatus::Loading,
            slot,
            solid_count: 0,
            version: 0,
        };
        chunk.voxels_mut().fill(VoxelId::AIR);
        chunk
    }

    /// Voxel count for a chunk of the given dimensions.
    pub fn volume_of(size: UVec3) -> usize {
        size.x as usize * size.y as usize * size.z as usize
    }

    /// Chunk-space position.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Voxels per axis.
    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// World units per voxel along each axis.
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    /// Number of voxels in this chunk.
    pub fn volume(&self) -> usize {
        Self::volume_of(self.size)
    }

    /// World-space position of the chunk's minimum corner.
    pub fn world_origin(&self) -> Vec3 {
        let c = Vec3::new(self.coord.x as f32, self.coord.y as f32, self.coord.z as f32);
        c * self.size.as_vec3() * self.voxel_size
    }

    /// Current load status.
    pub fn status(&self) -> ChunkStatus {
        self.status
    }

    /// Updates the load status.
    pub fn set_status(&mut self, status: ChunkStatus) {
        self.status = status;
    }

    /// Returns the voxel at `(x, y, z)`, or air if out of bounds.
    pub fn get(&self, x: u32, y: u32, z: u32) -> VoxelId {
        match self.index(x, y, z) {
            Some(i) => self.voxels()[i],
            None => {
                tracing::warn!("Chunk::get out of bounds: ({}, {}, {})", x, y, z);
                VoxelId::AIR
            }
        }
    }

    /// Sets the voxel at `(x, y, z)`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, z: u32, voxel: VoxelId) {
        let Some(i) = self.index(x, y, z) else {
            tracing::warn!("Chunk::set out of bounds: ({}, {}, {})", x, y, z);
            return;
        };
        self.voxels_mut()[i] = voxel;
        self.version += 1;
    }

    /// Fills every voxel with `voxel`.
    pub fn fill(&mut self, voxel: VoxelId) {
        self.voxels_mut().fill(voxel);
        self.version += 1;
    }

    /// Recomputes derived state after the voxels changed in bulk.
    pub fn recalculate_state(&mut self) {
        self.solid_count = self.voxels().iter().filter(|v| v.is_solid()).count();
    }

    /// Solid voxel count as of the last [`recalculate_state`](Self::recalculate_state).
    pub fn solid_count(&self) -> usize {
        self.solid_count
    }

    /// `true` if the chunk held only air at the last recalculation.
    pub fn is_empty(&self) -> bool {
        self.solid_count == 0
    }

    /// `true` if the chunk held no air at the last recalculation.
    pub fn is_full(&self) -> bool {
        self.solid_count == self.volume()
    }

    /// Mutation counter, bumped by every `set` and `fill`.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Voxel storage in `y`-major, then `z`, then `x` order.
    pub fn voxels(&self) -> &[VoxelId] {
        let volume = self.volume();
        &self.slot.voxels()[..volume]
    }

    fn voxels_mut(&mut self) -> &mut [VoxelId] {
        let volume = self.volume();
        &mut self.slot.voxels_mut()[..volume]
    }

    /// Consumes the chunk, returning the slot its voxels lived in.
    pub fn into_slot(self) -> PoolSlot {
        self.slot
    }

    fn index(&self, x: u32, y: u32, z: u32) -> Option<usize> {
        let s = self.size;
        if x >= s.x || y >= s.y || z >= s.z {
            return None;
        }
        Some((y as usize * s.z as usize + z as usize) * s.x as usize + x as usize)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ChunkPool;

    fn chunk_in(pool: &ChunkPool) -> Chunk {
        let slot = pool.allocate().expect("free slot");
        Chunk::new_in(slot, ChunkCoord::new(1, 2, 3), UVec3::splat(4), Vec3::ONE)
    }

    #[test]
    fn test_new_chunk_is_loading_and_air() {
        let pool = ChunkPool::new(1, 64);
        let chunk = chunk_in(&pool);
        assert_eq!(chunk.status(), ChunkStatus::Loading);
        assert!(chunk.voxels().iter().all(|v| *v == VoxelId::AIR));
        assert_eq!(chunk.coord(), ChunkCoord::new(1, 2, 3));
    }

    #[test]
    #[should_panic(expected = "pool slot too small for chunk: 63 < 64")]
    fn test_undersized_slot_panics() {
        let pool = ChunkPool::new(1, 63);
        let _ = chunk_in(&pool);
    }

    #[test]
    fn test_reused_slot_is_cleared() {
        let pool = ChunkPool::new(1, 64);
        let mut chunk = chunk_in(&pool);
        chunk.fill(VoxelId(9));
        pool.release(chunk.into_slot()).expect("own slot");

        let chunk = chunk_in(&pool);
        assert!(chunk.voxels().iter().all(|v| *v == VoxelId::AIR));
    }

    #[test]
    fn test_set_then_get() {
        let pool = ChunkPool::new(1, 64);
        let mut chunk = chunk_in(&pool);
        chunk.set(1, 2, 3, VoxelId(7));
        assert_eq!(chunk.get(1, 2, 3), VoxelId(7));
        assert_eq!(chunk.get(3, 2, 1), VoxelId::AIR);
        assert_eq!(chunk.version(), 1);
    }

    #[test]
    fn test_out_of_bounds_access_is_harmless() {
        let pool = ChunkPool::new(1, 64);
        let mut chunk = chunk_in(&pool);
        chunk.set(4, 0, 0, VoxelId(1));
        assert_eq!(chunk.get(4, 0, 0), VoxelId::AIR);
        assert_eq!(chunk.version(), 0);
    }

    #[test]
    fn test_recalculate_state_counts_solids() {
        let pool = ChunkPool::new(1, 64);
        let mut chunk = chunk_in(&pool);
        chunk.recalculate_state();
        assert!(chunk.is_empty());

        chunk.set(0, 0, 0, VoxelId(1));
        chunk.set(3, 3, 3, VoxelId(2));
        chunk.recalculate_state();
        assert_eq!(chunk.solid_count(), 2);
        assert!(!chunk.is_empty());

        chunk.fill(VoxelId(5));
        chunk.recalculate_state();
        assert!(chunk.is_full());
    }

    #[test]
    fn test_oversized_slot_only_exposes_volume() {
        let pool = ChunkPool::new(1, 100);
        let chunk = chunk_in(&pool);
        assert_eq!(chunk.voxels().len(), 64);
    }

    #[test]
    fn test_world_origin_scales_by_size_and_voxel() {
        let pool = ChunkPool::new(1, 8);
        let slot = pool.allocate().expect("slot");
        let chunk = Chunk::new_in(slot, ChunkCoord::new(-1, 0, 2), UVec3::splat(2), Vec3::splat(0.5));
        assert_eq!(chunk.world_origin(), Vec3::new(-1.0, 0.0, 2.0));
    }
}
