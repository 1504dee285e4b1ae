//! Error types for the chunk streaming core.

use crate::coord::ChunkCoord;

/// Errors that can occur when starting a [`ChunkStreamer`](crate::ChunkStreamer).
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The streamer configuration failed validation.
    #[error("invalid streamer config: {0}")]
    InvalidConfig(String),

    /// The pool's slots cannot hold a chunk of the configured size.
    #[error("pool slot holds {slot_len} voxels but a chunk needs {volume}")]
    SlotTooSmall {
        /// Voxels per pool slot.
        slot_len: usize,
        /// Voxels per chunk.
        volume: usize,
    },

    /// The worker thread could not be spawned.
    #[error("failed to spawn streaming worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors returned by [`ChunkPool`](crate::ChunkPool) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The slot was leased from a different pool.
    #[error("slot {0} does not belong to this pool")]
    ForeignSlot(usize),
}

/// A generator could not fill a chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("generation failed at {coord}: {reason}")]
pub struct GenerateError {
    /// Coordinate of the chunk being generated.
    pub coord: ChunkCoord,
    /// Human-readable cause.
    pub reason: String,
}

impl GenerateError {
    /// Creates a new generation error.
    pub fn new(coord: ChunkCoord, reason: impl Into<String>) -> Self {
        Self {
            coord,
            reason: reason.into(),
        }
    }
}
