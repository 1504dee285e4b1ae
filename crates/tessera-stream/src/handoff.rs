//! FIFO handoff of produced chunks from the worker to the consumer.
//!
//! The queue and the produced-coordinate set share one mutex, so a
//! coordinate is in the set exactly while its chunk sits in the queue.

use std::collections::VecDeque;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::chunk::Chunk;
use crate::coord::ChunkCoord;

/// A produced chunk paired with its coordinate.
#[derive(Debug)]
pub struct LoadedChunk {
    /// Where the chunk belongs.
    pub coord: ChunkCoord,
    /// The generated chunk, status `Loaded`.
    pub chunk: Chunk,
}

#[derive(Default)]
struct HandoffState {
    ready: VecDeque<LoadedChunk>,
    produced: FxHashSet<ChunkCoord>,
}

/// Mutex-guarded FIFO of [`LoadedChunk`]s plus the produced-coordinate set.
#[derive(Default)]
pub struct HandoffQueue {
    state: Mutex<HandoffState>,
}

impl HandoffQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a produced chunk and records its coordinate.
    pub fn push(&self, loaded: LoadedChunk) {
        let mut state = self.state.lock();
        state.produced.insert(loaded.coord);
        state.ready.push_back(loaded);
    }

    /// Removes the oldest chunk, forgetting its coordinate. Never blocks on
    /// anything but the queue mutex.
    pub fn pop(&self) -> Option<LoadedChunk> {
        let mut state = self.state.lock();
        let loaded = state.ready.pop_front()?;
        state.produced.remove(&loaded.coord);
        Some(loaded)
    }

    /// Returns `true` if `coord` has been produced but not yet consumed.
    pub fn is_produced(&self, coord: ChunkCoord) -> bool {
        self.state.lock().produced.contains(&coord)
    }

    /// Number of chunks waiting to be consumed.
    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ChunkPool;
    use glam::{UVec3, Vec3};

    fn produce(pool: &ChunkPool, coord: ChunkCoord) -> LoadedChunk {
        let slot = pool.allocate().expect("free slot");
        LoadedChunk {
            coord,
            chunk: Chunk::new_in(slot, coord, UVec3::splat(2), Vec3::ONE),
        }
    }

    #[test]
    fn test_pop_is_fifo() {
        let pool = ChunkPool::new(3, 8);
        let queue = HandoffQueue::new();
        let coords = [
            ChunkCoord::new(9, 0, 0),
            ChunkCoord::new(1, 0, 0),
            ChunkCoord::new(5, 0, 0),
        ];
        for c in coords {
            queue.push(produce(&pool, c));
        }

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|l| l.coord).collect();
        assert_eq!(popped, coords);
    }

    #[test]
    fn test_produced_set_mirrors_queue() {
        let pool = ChunkPool::new(2, 8);
        let queue = HandoffQueue::new();
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(0, 1, 0);

        queue.push(produce(&pool, a));
        queue.push(produce(&pool, b));
        assert!(queue.is_produced(a));
        assert!(queue.is_produced(b));
        assert_eq!(queue.len(), 2);

        let first = queue.pop().expect("entry");
        assert_eq!(first.coord, a);
        assert_eq!(first.chunk.coord(), a);
        assert!(!queue.is_produced(a));
        assert!(queue.is_produced(b));
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let queue = HandoffQueue::new();
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }
}
