//! Background streaming of voxel chunks around a moving viewpoint.
//!
//! A single worker thread keeps the set of chunks inside a box-shaped load
//! window around the world's center produced, nearest first, and hands them
//! to the foreground through a queue the consumer drains each frame. Chunk
//! storage is leased from a fixed-capacity [`ChunkPool`], so the worker
//! stalls rather than allocating when the consumer falls behind.

pub mod bounds;
pub mod chunk;
pub mod config;
pub mod coord;
pub mod error;
pub mod handoff;
pub mod pending;
pub mod pool;
pub mod scoring;
pub mod streamer;
mod placement;
mod worker;
pub mod world;

pub use bounds::{ChunkBounds, Frustum, Intersection};
pub use chunk::{Chunk, ChunkStatus, VoxelId};
pub use config::{
    DEFAULT_POOL_RETRY, DEFAULT_VERTICAL_BIAS, MAX_WINDOW_LEN, StreamerConfig, WorkerPriority,
    YieldThrottle, default_worker_core,
};
pub use coord::{ChunkCoord, window_coords};
pub use error::{GenerateError, PoolError, StreamError};
pub use handoff::{HandoffQueue, LoadedChunk};
pub use pending::PendingSet;
pub use pool::{ChunkPool, PoolSlot};
pub use scoring::{
    DEFAULT_FRUSTUM_DISCOUNT, FrustumPriority, NearestFirst, PriorityScorer, SharedFrustum,
};
pub use streamer::{ChunkStreamer, ChunkStreamerBuilder, WORKER_THREAD_NAME};
pub use worker::{StreamerStatsSnapshot, WorkerMode};
pub use world::{ChunkGenerator, ChunkWorld, ResidentWorld};
