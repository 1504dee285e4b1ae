//! The chunk streamer: lifecycle and control surface for the worker.
//!
//! The foreground thread owns a [`ChunkStreamer`]. It requests refreshes
//! when the viewpoint moves, polls [`ChunkStreamer::consume_loaded_chunk`]
//! each frame, and shuts the streamer down before tearing down the world
//! or the pool.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use tracing::{error, info};

use crate::config::StreamerConfig;
use crate::error::StreamError;
use crate::handoff::LoadedChunk;
use crate::pending::PendingSet;
use crate::pool::ChunkPool;
use crate::scoring::{NearestFirst, PriorityScorer};
use crate::worker::{Pacer, Shared, StreamerStatsSnapshot, Worker, WorkerMode};
use crate::world::{ChunkGenerator, ChunkWorld};

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "chunk-streamer";

/// Collects the collaborators for a [`ChunkStreamer`] before starting it.
pub struct ChunkStreamerBuilder {
    config: StreamerConfig,
    world: Arc<dyn ChunkWorld>,
    generator: Arc<dyn ChunkGenerator>,
    pool: ChunkPool,
    scorer: Box<dyn PriorityScorer>,
}

impl ChunkStreamerBuilder {
    /// Replaces the default [`NearestFirst`] scoring.
    pub fn scorer(mut self, scorer: impl PriorityScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    /// Validates the configuration and spawns the worker.
    pub fn start(self) -> Result<ChunkStreamer, StreamError> {
        self.config.validate()?;
        let volume = self.config.chunk_volume();
        if self.pool.slot_len() < volume {
            return Err(StreamError::SlotTooSmall {
                slot_len: self.pool.slot_len(),
                volume,
            });
        }

        let shared = Arc::new(Shared::new());
        let worker = Worker {
            config: self.config.clone(),
            shared: Arc::clone(&shared),
            world: self.world,
            generator: self.generator,
            scorer: self.scorer,
            pool: self.pool.clone(),
            pending: PendingSet::new(),
            pacer: Pacer::new(self.config.yield_throttle),
        };

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || worker.run())
            .map_err(StreamError::Spawn)?;

        info!(
            load_distance = %self.config.load_distance,
            chunk_size = %self.config.chunk_size,
            pool_capacity = self.pool.capacity(),
            "chunk streamer started"
        );

        Ok(ChunkStreamer {
            config: self.config,
            shared,
            pool: self.pool,
            worker: Some(handle),
        })
    }
}

/// Streams chunks around the world's center on a dedicated worker thread.
pub struct ChunkStreamer {
    config: StreamerConfig,
    shared: Arc<Shared>,
    pool: ChunkPool,
    worker: Option<JoinHandle<()>>,
}

impl ChunkStreamer {
    /// Starts a streamer with nearest-first scheduling.
    ///
    /// The worker begins idle; nothing is produced until the first
    /// [`request_refresh`](Self::request_refresh).
    pub fn start(
        config: StreamerConfig,
        world: Arc<dyn ChunkWorld>,
        generator: Arc<dyn ChunkGenerator>,
        pool: ChunkPool,
    ) -> Result<Self, StreamError> {
        Self::builder(config, world, generator, pool).start()
    }

    /// Returns a builder for installing a custom [`PriorityScorer`].
    pub fn builder(
        config: StreamerConfig,
        world: Arc<dyn ChunkWorld>,
        generator: Arc<dyn ChunkGenerator>,
        pool: ChunkPool,
    ) -> ChunkStreamerBuilder {
        ChunkStreamerBuilder {
            config,
            world,
            generator,
            pool,
            scorer: Box::new(NearestFirst),
        }
    }

    /// Halts the worker after the chunk it is currently producing, if any.
    ///
    /// # Panics
    ///
    /// Panics if the streamer is already paused.
    pub fn pause(&self) {
        let mut control = self.shared.control.lock();
        assert!(!control.paused, "ChunkStreamer::pause called while already paused");
        control.paused = true;
        self.shared.wake.notify_all();
    }

    /// Lets a paused worker continue. Does nothing if not paused.
    pub fn resume(&self) {
        let mut control = self.shared.control.lock();
        if !control.paused {
            return;
        }
        control.paused = false;
        self.shared.wake.notify_all();
    }

    /// Marks the pending set stale and wakes the worker.
    ///
    /// Requests made before the worker acts coalesce into one rebuild.
    pub fn request_refresh(&self) {
        let mut control = self.shared.control.lock();
        control.refresh_pending = true;
        self.shared.wake.notify_all();
    }

    /// Takes the oldest produced chunk without blocking on the worker.
    pub fn consume_loaded_chunk(&self) -> Option<LoadedChunk> {
        self.shared.handoff.pop()
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// A chunk already being generated is finished and queued; nothing new
    /// is started. Chunks still queued remain consumable. Calling this more
    /// than once is harmless.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        {
            let mut control = self.shared.control.lock();
            control.running = false;
            self.shared.wake.notify_all();
        }
        self.pool.notify_waiters();

        if handle.join().is_err() {
            error!("chunk streaming worker panicked");
            self.shared.control.lock().mode = WorkerMode::Stopped;
        }
        info!(
            ready = self.shared.handoff.len(),
            "chunk streamer shut down"
        );
    }

    /// What the worker is doing right now.
    pub fn mode(&self) -> WorkerMode {
        self.shared.control.lock().mode
    }

    /// Returns `true` between [`pause`](Self::pause) and [`resume`](Self::resume).
    pub fn is_paused(&self) -> bool {
        self.shared.control.lock().paused
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) is called.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Size of the worker's pending set as last published.
    pub fn pending_len(&self) -> usize {
        self.shared.pending_len.load(Ordering::Relaxed)
    }

    /// Number of produced chunks waiting to be consumed.
    pub fn ready_len(&self) -> usize {
        self.shared.handoff.len()
    }

    /// Worker counters.
    pub fn stats(&self) -> StreamerStatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// The configuration the streamer was started with.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// The pool chunks are allocated from.
    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }
}

impl Drop for ChunkStreamer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
