//! The background production loop.
//!
//! One decision is made per iteration under the control mutex: exit, wait
//! while paused, rebuild the pending set, produce the nearest pending chunk,
//! or go idle. Deciding before every chunk is what bounds a pause to the
//! chunk already in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, info_span, trace, warn};

use crate::chunk::{Chunk, ChunkStatus};
use crate::config::{StreamerConfig, YieldThrottle};
use crate::coord::ChunkCoord;
use crate::handoff::{HandoffQueue, LoadedChunk};
use crate::pending::PendingSet;
use crate::placement;
use crate::pool::{ChunkPool, PoolSlot};
use crate::scoring::PriorityScorer;
use crate::world::{ChunkGenerator, ChunkWorld};

/// What the worker is doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerMode {
    /// Waiting for a refresh request.
    Idle,
    /// Rebuilding the pending set or producing chunks.
    Active,
    /// Halted until resumed.
    Paused,
    /// The worker has exited.
    Stopped,
}

pub(crate) struct ControlState {
    pub(crate) running: bool,
    pub(crate) paused: bool,
    pub(crate) refresh_pending: bool,
    pub(crate) mode: WorkerMode,
}

/// Monotonic counters kept by the worker.
#[derive(Debug, Default)]
pub(crate) struct StreamerStats {
    refreshes: AtomicU64,
    produced: AtomicU64,
    failed: AtomicU64,
    pool_stalls: AtomicU64,
}

/// Point-in-time copy of the worker's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamerStatsSnapshot {
    /// Pending-set rebuilds performed.
    pub refreshes: u64,
    /// Chunks pushed onto the handoff queue.
    pub produced: u64,
    /// Chunks discarded after a generator error.
    pub failed: u64,
    /// Productions that had to wait for a pool slot.
    pub pool_stalls: u64,
}

impl StreamerStats {
    pub(crate) fn snapshot(&self) -> StreamerStatsSnapshot {
        StreamerStatsSnapshot {
            refreshes: self.refreshes.load(Ordering::Relaxed),
            produced: self.produced.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            pool_stalls: self.pool_stalls.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the streamer handle and its worker.
pub(crate) struct Shared {
    pub(crate) control: Mutex<ControlState>,
    pub(crate) wake: Condvar,
    pub(crate) handoff: HandoffQueue,
    pub(crate) stats: StreamerStats,
    pub(crate) pending_len: AtomicUsize,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            control: Mutex::new(ControlState {
                running: true,
                paused: false,
                refresh_pending: false,
                mode: WorkerMode::Idle,
            }),
            wake: Condvar::new(),
            handoff: HandoffQueue::new(),
            stats: StreamerStats::default(),
            pending_len: AtomicUsize::new(0),
        }
    }

    fn is_running(&self) -> bool {
        self.control.lock().running
    }
}

/// Marks the streamer stopped when the worker leaves `run`, including by
/// unwinding out of a panicking generator.
struct ExitGuard(Arc<Shared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("chunk streaming worker panicked");
        }
        let mut control = self.0.control.lock();
        control.running = false;
        control.mode = WorkerMode::Stopped;
        self.0.pending_len.store(0, Ordering::Relaxed);
    }
}

/// Counts productions against the configured [`YieldThrottle`].
pub(crate) struct Pacer {
    throttle: Option<YieldThrottle>,
    since_yield: u32,
}

impl Pacer {
    pub(crate) fn new(throttle: Option<YieldThrottle>) -> Self {
        Self {
            throttle,
            since_yield: 0,
        }
    }

    /// Records one production. Returns how long to sleep, if at all.
    pub(crate) fn tick(&mut self) -> Option<Duration> {
        let throttle = self.throttle?;
        self.since_yield += 1;
        if self.since_yield < throttle.every.get() {
            return None;
        }
        self.since_yield = 0;
        Some(throttle.pause)
    }
}

enum Step {
    Exit,
    Refresh,
    Produce,
}

pub(crate) struct Worker {
    pub(crate) config: StreamerConfig,
    pub(crate) shared: Arc<Shared>,
    pub(crate) world: Arc<dyn ChunkWorld>,
    pub(crate) generator: Arc<dyn ChunkGenerator>,
    pub(crate) scorer: Box<dyn PriorityScorer>,
    pub(crate) pool: ChunkPool,
    pub(crate) pending: PendingSet,
    pub(crate) pacer: Pacer,
}

impl Worker {
    pub(crate) fn run(mut self) {
        let span = info_span!(
            "chunk_streamer",
            core = self.config.resolved_core(),
            priority = ?self.config.worker_priority
        );
        let _enter = span.enter();
        let _guard = ExitGuard(Arc::clone(&self.shared));
        let pinned = placement::pin_current_thread(self.config.resolved_core());
        let prioritized = placement::apply_priority(self.config.worker_priority);
        info!(pinned, prioritized, "worker started");

        loop {
            match self.next_step() {
                Step::Exit => break,
                Step::Refresh => self.refresh(),
                Step::Produce => self.produce_nearest(),
            }
        }

        self.pending.clear();
        info!("worker stopped");
    }

    fn next_step(&self) -> Step {
        let mut control = self.shared.control.lock();
        loop {
            if !control.running {
                control.mode = WorkerMode::Stopped;
                return Step::Exit;
            }
            if control.paused {
                if control.mode != WorkerMode::Paused {
                    debug!(pending = self.pending.len(), "paused");
                }
                control.mode = WorkerMode::Paused;
                self.shared.wake.wait(&mut control);
                continue;
            }
            if control.refresh_pending {
                control.refresh_pending = false;
                control.mode = WorkerMode::Active;
                return Step::Refresh;
            }
            if !self.pending.is_empty() {
                control.mode = WorkerMode::Active;
                return Step::Produce;
            }
            control.mode = WorkerMode::Idle;
            self.shared.wake.wait(&mut control);
        }
    }

    fn refresh(&mut self) {
        let center = self.world.center();
        let world = self.world.as_ref();
        let handoff = &self.shared.handoff;
        self.pending.rebuild(center, self.config.load_distance, |coord| {
            world.is_resident(coord) || handoff.is_produced(coord)
        });
        self.shared
            .pending_len
            .store(self.pending.len(), Ordering::Relaxed);
        self.shared.stats.refreshes.fetch_add(1, Ordering::Relaxed);
        debug!(%center, pending = self.pending.len(), "rebuilt pending set");
    }

    fn produce_nearest(&mut self) {
        let center = self.world.center();
        let Some(coord) = self.pending.take_nearest(
            center,
            self.config.vertical_bias,
            self.scorer.as_ref(),
            self.world.as_ref(),
        ) else {
            return;
        };
        self.shared
            .pending_len
            .store(self.pending.len(), Ordering::Relaxed);

        let Some(slot) = self.acquire_slot(coord) else {
            debug!(%coord, "shutdown while waiting for a pool slot");
            return;
        };

        let mut chunk = Chunk::new_in(slot, coord, self.config.chunk_size, self.config.voxel_size);
        if let Err(err) = self.generator.generate(&mut chunk) {
            chunk.set_status(ChunkStatus::Failed);
            self.shared.stats.failed.fetch_add(1, Ordering::Relaxed);
            warn!(%coord, error = %err, "chunk generation failed, discarding");
            if let Err(err) = self.pool.release(chunk.into_slot()) {
                error!(%coord, error = %err, "failed to return slot of discarded chunk");
            }
            return;
        }

        chunk.set_status(ChunkStatus::Loaded);
        self.world.on_chunk_loaded(&mut chunk);
        self.shared.handoff.push(LoadedChunk { coord, chunk });
        self.shared.stats.produced.fetch_add(1, Ordering::Relaxed);
        trace!(%coord, "chunk produced");

        if let Some(pause) = self.pacer.tick() {
            trace!(pause_ms = pause.as_millis() as u64, "yielding");
            std::thread::sleep(pause);
        }
    }

    /// Leases a slot, waiting out pool exhaustion unless the streamer stops.
    fn acquire_slot(&self, coord: ChunkCoord) -> Option<PoolSlot> {
        if let Some(slot) = self.pool.allocate() {
            return Some(slot);
        }
        self.shared.stats.pool_stalls.fetch_add(1, Ordering::Relaxed);
        debug!(%coord, capacity = self.pool.capacity(), "pool exhausted, waiting for a release");
        let shared = &self.shared;
        self.pool
            .allocate_blocking(self.config.pool_retry_interval, || shared.is_running())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn test_pacer_without_throttle_never_pauses() {
        let mut pacer = Pacer::new(None);
        assert!((0..100).all(|_| pacer.tick().is_none()));
    }

    #[test]
    fn test_pacer_pauses_every_nth_chunk() {
        let pause = Duration::from_millis(3);
        let mut pacer = Pacer::new(Some(YieldThrottle {
            every: NonZeroU32::new(2).unwrap(),
            pause,
        }));
        let ticks: Vec<_> = (0..5).map(|_| pacer.tick()).collect();
        assert_eq!(ticks, vec![None, Some(pause), None, Some(pause), None]);
    }

    #[test]
    fn test_exit_guard_marks_stopped_on_panic() {
        let shared = Arc::new(Shared::new());
        shared.pending_len.store(5, Ordering::Relaxed);
        let guarded = Arc::clone(&shared);
        let result = std::thread::spawn(move || {
            let _guard = ExitGuard(guarded);
            panic!("generator blew up");
        })
        .join();

        assert!(result.is_err());
        let control = shared.control.lock();
        assert_eq!(control.mode, WorkerMode::Stopped);
        assert!(!control.running);
        assert_eq!(shared.pending_len.load(Ordering::Relaxed), 0);
    }
}
