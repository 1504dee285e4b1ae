//! Bounded, thread-safe pool of chunk-sized voxel buffers.
//!
//! All buffers are allocated up front so streaming never touches the global
//! allocator. A [`PoolSlot`] owns its buffer while leased. It goes back to
//! the pool through [`ChunkPool::release`], or on drop if the owner never
//! releases it explicitly, so outstanding slots can never exceed capacity.
//! Releasing a slot wakes any thread blocked in
//! [`ChunkPool::allocate_blocking`].

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::chunk::VoxelId;
use crate::error::PoolError;

struct PoolState {
    /// Free buffers tagged with their slot index.
    free: Vec<(usize, Box<[VoxelId]>)>,
}

struct PoolShared {
    state: Mutex<PoolState>,
    released: Condvar,
    capacity: usize,
    slot_len: usize,
}

impl PoolShared {
    fn give_back(&self, index: usize, voxels: Box<[VoxelId]>) {
        self.state.lock().free.push((index, voxels));
        self.released.notify_one();
    }
}

/// A voxel buffer leased from a [`ChunkPool`].
pub struct PoolSlot {
    index: usize,
    voxels: Box<[VoxelId]>,
    pool: Weak<PoolShared>,
}

impl PoolSlot {
    /// Index of this slot within its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of voxels the slot can hold.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Returns `true` if the slot has no storage.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub(crate) fn voxels(&self) -> &[VoxelId] {
        &self.voxels
    }

    pub(crate) fn voxels_mut(&mut self) -> &mut [VoxelId] {
        &mut self.voxels
    }
}

impl Drop for PoolSlot {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.give_back(self.index, std::mem::take(&mut self.voxels));
        }
    }
}

impl fmt::Debug for PoolSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolSlot")
            .field("index", &self.index)
            .field("len", &self.voxels.len())
            .finish()
    }
}

/// Fixed-capacity allocator of chunk-sized slots.
///
/// Cloning yields another handle to the same pool, so the streaming worker
/// can allocate while the consumer releases.
#[derive(Clone)]
pub struct ChunkPool {
    shared: Arc<PoolShared>,
}

impl ChunkPool {
    /// Creates a pool of `capacity` slots, each holding `slot_len` voxels.
    pub fn new(capacity: usize, slot_len: usize) -> Self {
        let free = (0..capacity)
            .rev()
            .map(|i| (i, vec![VoxelId::AIR; slot_len].into_boxed_slice()))
            .collect();
        Self {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState { free }),
                released: Condvar::new(),
                capacity,
                slot_len,
            }),
        }
    }

    /// Leases a free slot, or returns `None` if the pool is exhausted.
    pub fn allocate(&self) -> Option<PoolSlot> {
        let (index, voxels) = self.shared.state.lock().free.pop()?;
        Some(PoolSlot {
            index,
            voxels,
            pool: Arc::downgrade(&self.shared),
        })
    }

    /// Leases a slot, waiting for a release while the pool is exhausted.
    ///
    /// Each wait lasts at most `retry`. `keep_waiting` is polled between
    /// attempts; once it returns `false` the call gives up with `None`.
    pub fn allocate_blocking(
        &self,
        retry: Duration,
        mut keep_waiting: impl FnMut() -> bool,
    ) -> Option<PoolSlot> {
        loop {
            if let Some(slot) = self.allocate() {
                return Some(slot);
            }
            if !keep_waiting() {
                return None;
            }
            let mut state = self.shared.state.lock();
            if state.free.is_empty() {
                self.shared.released.wait_for(&mut state, retry);
            }
        }
    }

    /// Returns a slot to the pool.
    ///
    /// A slot leased from another pool is rejected with
    /// [`PoolError::ForeignSlot`] and goes back to its own pool instead.
    pub fn release(&self, slot: PoolSlot) -> Result<(), PoolError> {
        if Weak::as_ptr(&slot.pool) != Arc::as_ptr(&self.shared) {
            return Err(PoolError::ForeignSlot(slot.index));
        }
        drop(slot);
        Ok(())
    }

    /// Wakes every thread blocked in [`allocate_blocking`](Self::allocate_blocking)
    /// so it re-polls its stop condition.
    pub fn notify_waiters(&self) {
        self.shared.released.notify_all();
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Voxels per slot.
    pub fn slot_len(&self) -> usize {
        self.shared.slot_len
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.shared.state.lock().free.len()
    }

    /// Number of slots currently leased.
    pub fn outstanding(&self) -> usize {
        self.capacity() - self.available()
    }
}

impl fmt::Debug for ChunkPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkPool")
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .field("slot_len", &self.slot_len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
